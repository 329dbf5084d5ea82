//! `AF_UNIX`/`SOCK_DGRAM` transport carrying the header+payload wire format
//! and, where needed, `SCM_RIGHTS` ancillary file descriptors.

use crate::command::{Header, MAX_FDS};
use crate::error::{ProtocolError, Result};
use log::debug;
use nix::sys::socket::{
    bind, recvmsg, sendmsg, socket, AddressFamily, ControlMessage, ControlMessageOwned, MsgFlags,
    SockFlag, SockType, UnixAddr,
};
use std::io::{IoSlice, IoSliceMut};
use std::os::unix::io::{FromRawFd, OwnedFd, RawFd};
use std::path::Path;

/// A bound `AF_UNIX`/`SOCK_DGRAM` endpoint, either the container's
/// control server or one of the host's per-client sockets.
pub struct ControlSocket {
    fd: OwnedFd,
}

impl ControlSocket {
    /// Bind a fresh datagram socket at `path`. The caller is responsible
    /// for opening the server socket only after chroot, so the bound path
    /// lives inside the container's mount namespace.
    pub fn bind(path: &Path) -> Result<Self> {
        let fd = socket(
            AddressFamily::Unix,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )
        .map_err(ProtocolError::from)?;
        let addr = UnixAddr::new(path).map_err(ProtocolError::from)?;
        bind(fd, &addr).map_err(ProtocolError::from)?;
        debug!("control socket bound at {}", path.display());
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        use std::os::unix::io::AsRawFd;
        self.fd.as_raw_fd()
    }

    /// Send `header` + `payload` to `dest`, optionally with `fds` attached
    /// as `SCM_RIGHTS` ancillary data. At most [`MAX_FDS`] fds per message.
    /// `SOCK_DGRAM` requires an explicit destination on every send since
    /// neither endpoint calls `connect`.
    pub fn send_to(
        &self,
        dest: &Path,
        header: Header,
        payload: &[u8],
        fds: &[RawFd],
    ) -> Result<()> {
        if fds.len() > MAX_FDS {
            return Err(ProtocolError::TooManyFds {
                max: MAX_FDS,
                actual: fds.len(),
            });
        }
        let addr = UnixAddr::new(dest).map_err(ProtocolError::from)?;
        let header_bytes = header.encode();
        let iov = [IoSlice::new(&header_bytes), IoSlice::new(payload)];

        let cmsgs: Vec<ControlMessage> = if fds.is_empty() {
            Vec::new()
        } else {
            vec![ControlMessage::ScmRights(fds)]
        };

        sendmsg(self.as_raw_fd(), &iov, &cmsgs, MsgFlags::empty(), Some(&addr))
            .map_err(ProtocolError::from)?;
        Ok(())
    }

    /// Receive one datagram, returning its header, payload bytes and any
    /// `SCM_RIGHTS` fds attached to it.
    pub fn recv(&self, max_payload: usize) -> Result<(Header, Vec<u8>, Vec<OwnedFd>)> {
        let (header, payload, fds, _) = self.recv_from(max_payload)?;
        Ok((header, payload, fds))
    }

    /// Like [`recv`](Self::recv) but also returns the sender's bound
    /// address, needed to reply on a connectionless `SOCK_DGRAM` socket
    /// where neither side calls `connect`.
    pub fn recv_from(
        &self,
        max_payload: usize,
    ) -> Result<(Header, Vec<u8>, Vec<OwnedFd>, Option<UnixAddr>)> {
        let mut header_buf = [0u8; crate::command::HEADER_LEN];
        let mut payload_buf = vec![0u8; max_payload];
        let mut cmsg_space = nix::cmsg_space!([RawFd; MAX_FDS]);

        let mut iov = [
            IoSliceMut::new(&mut header_buf),
            IoSliceMut::new(&mut payload_buf),
        ];
        let msg = recvmsg::<UnixAddr>(
            self.as_raw_fd(),
            &mut iov,
            Some(&mut cmsg_space),
            MsgFlags::MSG_CMSG_CLOEXEC,
        )
        .map_err(ProtocolError::from)?;

        let header = Header::decode(&header_buf)?;
        let received = msg.bytes.saturating_sub(crate::command::HEADER_LEN);
        if received != header.length as usize {
            return Err(ProtocolError::LengthMismatch {
                declared: header.length,
                actual: received,
            });
        }
        payload_buf.truncate(received);

        let mut fds = Vec::new();
        for cmsg in msg.cmsgs() {
            if let ControlMessageOwned::ScmRights(raw_fds) = cmsg {
                for raw in raw_fds {
                    fds.push(unsafe { OwnedFd::from_raw_fd(raw) });
                }
            }
        }

        Ok((header, payload_buf, fds, msg.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandType;
    use anyhow::Result;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn send_recv_round_trips_header_and_payload() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server_path = dir.path().join("control");
        let client_path = dir.path().join("client-1");

        let server = ControlSocket::bind(&server_path)?;
        let client = ControlSocket::bind(&client_path)?;

        let header = Header::new(CommandType::Destroy, 3);
        client.send_to(&server_path, header, b"hey", &[])?;

        let (recv_header, payload, fds) = server.recv(64)?;
        assert_eq!(recv_header, header);
        assert_eq!(&payload, b"hey");
        assert!(fds.is_empty());
        Ok(())
    }

    #[test]
    fn recv_from_reports_the_sender_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server_path = dir.path().join("control");
        let client_path = dir.path().join("client-1");

        let server = ControlSocket::bind(&server_path)?;
        let client = ControlSocket::bind(&client_path)?;

        let header = Header::new(CommandType::GetRoot, 0);
        client.send_to(&server_path, header, &[], &[])?;

        let (_, _, _, addr) = server.recv_from(64)?;
        let addr = addr.expect("datagram carries a sender address");
        assert_eq!(addr.path(), Some(client_path.as_path()));
        Ok(())
    }

    #[test]
    fn send_recv_carries_scm_rights_fd() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server_path = dir.path().join("control");
        let client_path = dir.path().join("client-1");

        let server = ControlSocket::bind(&server_path)?;
        let client = ControlSocket::bind(&client_path)?;

        let passed_file = std::fs::File::open("/dev/null")?;
        let header = Header::new(CommandType::GetFds, 0);
        client.send_to(&server_path, header, &[], &[passed_file.as_raw_fd()])?;

        let (_, _, fds) = server.recv(64)?;
        assert_eq!(fds.len(), 1);
        Ok(())
    }
}

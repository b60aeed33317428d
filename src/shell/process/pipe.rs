use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};

use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::unistd::{dup2, pipe};

use crate::shell::error::{Result, ShellError};

fn close_on_exec(fd: &OwnedFd) -> Result<()> {
    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
        .map(|_| ())
        .map_err(ShellError::system("fcntl"))
}

/// An anonymous pipe whose ends can be closed independently.
///
/// Both ends are close-on-exec; duplicating an end onto a standard
/// descriptor is what hands it to an exec'd program. Reading or writing a
/// closed end does nothing.
#[derive(Debug)]
pub struct Pipe {
    reader: Option<File>,
    writer: Option<File>,
}

impl Pipe {
    pub fn new() -> Result<Pipe> {
        let (reader, writer) = pipe().map_err(ShellError::system("pipe"))?;
        close_on_exec(&reader)?;
        close_on_exec(&writer)?;
        Ok(Pipe {
            reader: Some(File::from(reader)),
            writer: Some(File::from(writer)),
        })
    }

    pub fn reader(&self) -> Option<&File> {
        self.reader.as_ref()
    }

    pub fn writer(&self) -> Option<&File> {
        self.writer.as_ref()
    }

    pub fn close_reader(&mut self) {
        self.reader = None;
    }

    pub fn close_writer(&mut self) {
        self.writer = None;
    }

    pub fn close(&mut self) {
        self.close_reader();
        self.close_writer();
    }

    /// Makes reads from the pipe return immediately when it is empty.
    pub fn set_nonblocking_reader(&self) -> Result<()> {
        if let Some(ref reader) = self.reader {
            let fd = reader.as_raw_fd();
            let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(ShellError::system("fcntl"))?;
            let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
            fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(ShellError::system("fcntl"))?;
        }
        Ok(())
    }

    /// Duplicates the read end onto `target`, typically stdin.
    pub fn redirect_reader(&self, target: RawFd) -> Result<()> {
        Self::redirect(self.reader.as_ref(), target)
    }

    /// Duplicates the write end onto `target`, typically stdout.
    pub fn redirect_writer(&self, target: RawFd) -> Result<()> {
        Self::redirect(self.writer.as_ref(), target)
    }

    fn redirect(end: Option<&File>, target: RawFd) -> Result<()> {
        match end {
            Some(file) => dup2(file.as_raw_fd(), target)
                .map(|_| ())
                .map_err(ShellError::system("dup2")),
            None => Ok(()),
        }
    }

    /// Writes a single flag into the pipe.
    pub fn send(&mut self, value: bool) {
        if let Some(ref mut writer) = self.writer {
            let _ = writer.write_all(&[value as u8]);
        }
    }

    /// Reads a flag written by `send`, if one is pending.
    pub fn receive(&mut self) -> Option<bool> {
        let reader = self.reader.as_mut()?;
        let mut byte = [0u8; 1];
        match reader.read(&mut byte) {
            Ok(1) => Some(byte[0] != 0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_travel_from_writer_to_reader() {
        let mut pipe = Pipe::new().unwrap();
        pipe.send(true);
        assert_eq!(pipe.receive(), Some(true));
        pipe.send(false);
        assert_eq!(pipe.receive(), Some(false));
    }

    #[test]
    fn empty_nonblocking_pipe_yields_nothing() {
        let mut pipe = Pipe::new().unwrap();
        pipe.set_nonblocking_reader().unwrap();
        assert_eq!(pipe.receive(), None);
    }

    #[test]
    fn closed_ends_are_silent() {
        let mut pipe = Pipe::new().unwrap();
        pipe.set_nonblocking_reader().unwrap();
        pipe.close_writer();
        pipe.send(true);
        assert!(pipe.writer().is_none());
        assert_eq!(pipe.receive(), None);
        pipe.close();
        assert!(pipe.reader().is_none());
        assert_eq!(pipe.receive(), None);
        pipe.redirect_reader(0).unwrap();
    }

    #[test]
    fn ends_are_close_on_exec() {
        let pipe = Pipe::new().unwrap();
        for end in [pipe.reader(), pipe.writer()].iter() {
            let fd = end.unwrap().as_raw_fd();
            let flags = FdFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFD).unwrap());
            assert!(flags.contains(FdFlag::FD_CLOEXEC));
        }
    }
}

// src/source.rs
//! Sequential byte source the framer reads from.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// Forward-reading cursor with end-of-stream detection.
///
/// The only backward movement is [`ByteSource::rewind_one`], used by resync.
pub trait ByteSource {
    /// Fills `buf` as far as the source allows. A short count means end of data.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Skips up to `n` bytes and returns the new position.
    fn skip(&mut self, n: u64) -> io::Result<u64>;

    /// Steps back over the last byte read.
    fn rewind_one(&mut self) -> io::Result<()>;

    fn tell(&self) -> u64;

    /// True once a read has hit the end of data.
    fn at_end(&self) -> bool;

    fn read_u8(&mut self) -> io::Result<Option<u8>> {
        let mut b = [0u8; 1];
        Ok(match self.read(&mut b)? {
            0 => None,
            _ => Some(b[0]),
        })
    }
}

/// [`ByteSource`] over any std reader that can seek.
///
/// The byte handed back by [`ByteSource::rewind_one`] is kept in a one-byte
/// pushback slot, so the inner reader (and any `BufReader` buffer in it) is
/// never seeked during resync.
pub struct IoSource<R> {
    inner: R,
    pos: u64,
    eof: bool,
    /// Last byte returned by `read`, if `read` was the last operation
    last: Option<u8>,
    /// Byte rewound over, served before the inner reader
    pushback: Option<u8>,
}

impl<R: Read + Seek> IoSource<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self {
            inner,
            pos,
            eof: false,
            last: None,
            pushback: None,
        })
    }
}

impl<R: Read + Seek> ByteSource for IoSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut filled = 0;
        if let Some(b) = self.pushback.take() {
            buf[0] = b;
            filled = 1;
        }
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.pos += filled as u64;
        self.last = filled.checked_sub(1).map(|i| buf[i]);
        Ok(filled)
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        self.last = None;
        let mut remaining = n;
        if remaining > 0 && self.pushback.take().is_some() {
            self.pos += 1;
            remaining -= 1;
        }
        // drain rather than seek so a truncated source reports a short skip
        let copied = io::copy(&mut (&mut self.inner).take(remaining), &mut io::sink())?;
        if copied < remaining {
            self.eof = true;
        }
        self.pos += copied;
        Ok(self.pos)
    }

    fn rewind_one(&mut self) -> io::Result<()> {
        match self.last.take() {
            Some(b) => self.pushback = Some(b),
            None => {
                // nothing buffered to hand back
                if self.pushback.take().is_some() {
                    self.inner.seek(SeekFrom::Current(-2))?;
                } else {
                    self.inner.seek(SeekFrom::Current(-1))?;
                }
            }
        }
        self.pos -= 1;
        self.eof = false;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn at_end(&self) -> bool {
        self.eof
    }
}

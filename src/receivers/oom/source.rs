// SPDX-License-Identifier: Apache-2.0

//! Blocking line reader over the kernel log device.

use std::io::{self, BufRead, BufReader, Read};

/// Read buffer size. Each read(2) on /dev/kmsg returns exactly one record and
/// fails with EINVAL if the buffer cannot hold it; records are capped at 8KB
/// (CONSOLE_EXT_LOG_MAX) including the dictionary.
const READ_BUF_SIZE: usize = 8192;

/// Yields raw lines, in order, until end-of-stream or the first I/O error.
///
/// Line terminators (`\n`, `\r\n`) are removed. Bytes that are not valid UTF-8
/// are replaced rather than ending the stream. Once `None` or an error has been
/// returned the source is exhausted for good; the only way to read again is to
/// reopen the underlying stream.
pub struct LineSource<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUF_SIZE, reader),
            buf: Vec::with_capacity(READ_BUF_SIZE),
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<R: Read> Iterator for LineSource<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

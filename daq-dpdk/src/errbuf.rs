// SPDX-License-Identifier: Apache-2.0
// Copyright The daq-dpdk Authors

//! Fixed-size rolling error message buffer.

use arrayvec::ArrayString;
use core::fmt::{self, Write};

/// Capacity of the error buffer.
pub(crate) const ERRBUF_SIZE: usize = 256;

/// Holds a description of the most recent failure; each write replaces the
/// previous message and truncates at the fixed capacity.
#[derive(Debug, Default)]
pub(crate) struct ErrBuf(ArrayString<ERRBUF_SIZE>);

struct Truncating<'a>(&'a mut ArrayString<ERRBUF_SIZE>);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.0.remaining_capacity();
        if s.len() <= room {
            self.0.push_str(s);
        } else {
            let mut end = room;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            self.0.push_str(&s[..end]);
        }
        Ok(())
    }
}

impl ErrBuf {
    pub(crate) fn set(&mut self, args: fmt::Arguments<'_>) {
        self.0.clear();
        // Truncating::write_str never fails
        let _ = Truncating(&mut self.0).write_fmt(args);
    }

    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

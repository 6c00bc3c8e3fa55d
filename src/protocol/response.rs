//! Query reply formatting: `<code><field>[#<field>…]$`.

use core::fmt::Write;

use heapless::String;

pub const FIELD_SEPARATOR: char = '#';
pub const END_MARKER: char = '$';
pub const RESPONSE_CAPACITY: usize = 64;

pub type Response = String<RESPONSE_CAPACITY>;

/// Builds one reply.  Output that would overflow the buffer is cut short,
/// but the end marker is always kept; the longest reply (three channel
/// temperatures) fits with room to spare.
pub struct ResponseBuilder {
    buf: Response,
    fields: usize,
}

impl ResponseBuilder {
    pub fn new(code: char) -> Self {
        let mut buf = Response::new();
        let _ = buf.push(code);
        Self { buf, fields: 0 }
    }

    fn separator(&mut self) {
        if self.fields > 0 {
            let _ = self.buf.push(FIELD_SEPARATOR);
        }
        self.fields += 1;
    }

    pub fn int(mut self, value: impl Into<i64>) -> Self {
        self.separator();
        let _ = write!(self.buf, "{}", value.into());
        self
    }

    pub fn float(mut self, value: f32, decimals: usize) -> Self {
        self.separator();
        let _ = write!(self.buf, "{:.*}", decimals, value);
        self
    }

    pub fn text(mut self, value: &str) -> Self {
        self.separator();
        let _ = self.buf.push_str(value);
        self
    }

    pub fn finish(mut self) -> Response {
        if self.buf.push(END_MARKER).is_err() {
            let _ = self.buf.pop();
            let _ = self.buf.push(END_MARKER);
        }
        self.buf
    }
}

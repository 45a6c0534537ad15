//! Byte codec helpers shared by coins and proofs.
//!
//! Optional fields are written as `len(1) ‖ bytes` where a zero length means
//! the field is absent.

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};

use crate::{params::POINT_SIZE, PrivacyError, Result};

pub fn point_to_bytes(p: &RistrettoPoint) -> [u8; 32] {
    p.compress().to_bytes()
}

pub fn point_from_bytes(b: &[u8]) -> Result<RistrettoPoint> {
    let arr: [u8; 32] = b
        .try_into()
        .map_err(|_| PrivacyError::MalformedEncoding("point length"))?;
    CompressedRistretto(arr)
        .decompress()
        .ok_or(PrivacyError::InvalidCurveElement("point decompress"))
}

pub fn scalar_from_bytes(b: &[u8]) -> Result<Scalar> {
    let arr: [u8; 32] = b
        .try_into()
        .map_err(|_| PrivacyError::MalformedEncoding("scalar length"))?;
    Option::from(Scalar::from_canonical_bytes(arr))
        .ok_or(PrivacyError::InvalidCurveElement("non-canonical scalar"))
}

/// Cursor over an input buffer. Every read is bounds-checked.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.offset..]
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = *self
            .buf
            .get(self.offset)
            .ok_or(PrivacyError::MalformedEncoding("truncated buffer"))?;
        self.offset += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(PrivacyError::MalformedEncoding("truncated buffer"))?;
        let out = &self.buf[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_point(&mut self) -> Result<RistrettoPoint> {
        point_from_bytes(self.read_bytes(POINT_SIZE)?)
    }

    pub fn read_scalar(&mut self) -> Result<Scalar> {
        scalar_from_bytes(self.read_bytes(POINT_SIZE)?)
    }

    /// `len(1) ‖ bytes`.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8]> {
        let n = self.read_u8()? as usize;
        self.read_bytes(n)
    }

    /// `len(2, BE) ‖ bytes`.
    pub fn read_len16_prefixed(&mut self) -> Result<&'a [u8]> {
        let n = self.read_u16_be()? as usize;
        self.read_bytes(n)
    }

    /// `len(4, BE) ‖ bytes`.
    pub fn read_len32_prefixed(&mut self) -> Result<&'a [u8]> {
        let n = self.read_u32_be()? as usize;
        self.read_bytes(n)
    }

    pub fn read_opt_point(&mut self) -> Result<Option<RistrettoPoint>> {
        match self.read_u8()? as usize {
            0 => Ok(None),
            POINT_SIZE => Ok(Some(self.read_point()?)),
            _ => Err(PrivacyError::MalformedEncoding("point field length")),
        }
    }

    pub fn read_opt_scalar(&mut self) -> Result<Option<Scalar>> {
        match self.read_u8()? as usize {
            0 => Ok(None),
            POINT_SIZE => Ok(Some(self.read_scalar()?)),
            _ => Err(PrivacyError::MalformedEncoding("scalar field length")),
        }
    }

    /// A point that must be present: `0x20 ‖ point`.
    pub fn read_prefixed_point(&mut self) -> Result<RistrettoPoint> {
        self.read_opt_point()?
            .ok_or(PrivacyError::MalformedEncoding("missing point"))
    }

    /// `count(1) ‖ (0x20 ‖ point)×count`.
    pub fn read_point_list(&mut self) -> Result<Vec<RistrettoPoint>> {
        let n = self.read_u8()? as usize;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_prefixed_point()?);
        }
        Ok(out)
    }

    pub fn finish(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PrivacyError::MalformedEncoding("trailing bytes"))
        }
    }
}

pub fn write_opt_point(out: &mut Vec<u8>, p: Option<&RistrettoPoint>) {
    match p {
        Some(p) => {
            out.push(POINT_SIZE as u8);
            out.extend_from_slice(p.compress().as_bytes());
        }
        None => out.push(0),
    }
}

pub fn write_opt_scalar(out: &mut Vec<u8>, s: Option<&Scalar>) {
    match s {
        Some(s) => {
            out.push(POINT_SIZE as u8);
            out.extend_from_slice(s.as_bytes());
        }
        None => out.push(0),
    }
}

pub fn write_point_list(out: &mut Vec<u8>, ps: &[RistrettoPoint]) {
    out.push(ps.len() as u8);
    for p in ps {
        write_opt_point(out, Some(p));
    }
}

/// `len(1) ‖ bytes`, with `bytes` cut to 255.
pub fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    let n = bytes.len().min(u8::MAX as usize);
    out.push(n as u8);
    out.extend_from_slice(&bytes[..n]);
}

pub fn write_len16_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
}

pub fn write_len32_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Big-endian magnitude without leading zero bytes; zero encodes as empty.
pub fn u64_to_be_trimmed(v: u64) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

pub fn u64_from_be_trimmed(b: &[u8]) -> Result<u64> {
    if b.len() > 8 {
        return Err(PrivacyError::MalformedEncoding("value exceeds 8 bytes"));
    }
    Ok(b.iter().fold(0u64, |acc, x| (acc << 8) | *x as u64))
}

use anyhow::{bail, ensure, Result};
use bytes::Bytes;
use smallvec::SmallVec;

/// Where the execution engine runs. Resolved once at startup and never
/// migrated afterwards; host-side tensors always live in CPU memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F64,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
            DType::U8 => 1,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I64 => "i64",
            DType::I32 => "i32",
            DType::U8 => "u8",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }
    /// Leading (batch) dimension, 1 for rank-0 shapes.
    pub fn leading(&self) -> usize {
        self.0.first().copied().unwrap_or(1)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

/// A dense host tensor: dtype + shape + little-endian bytes.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub dtype: DType,
    pub shape: Shape,
    pub bytes: Bytes,
}

impl Tensor {
    pub fn from_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Result<Self> {
        ensure!(
            bytes.len() == shape.numel() * dtype.byte_size(),
            "tensor byte length {} does not match {} x {}",
            bytes.len(),
            shape,
            dtype
        );
        Ok(Self {
            dtype,
            shape,
            bytes,
        })
    }

    pub fn from_f32s(shape: Shape, data: &[f32]) -> Result<Self> {
        let mut bytes = Vec::with_capacity(data.len() * 4);
        for v in data {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Self::from_bytes(DType::F32, shape, Bytes::from(bytes))
    }

    pub fn from_i64s(shape: Shape, data: &[i64]) -> Result<Self> {
        let mut bytes = Vec::with_capacity(data.len() * 8);
        for v in data {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Self::from_bytes(DType::I64, shape, Bytes::from(bytes))
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Decode the storage as f32 values. Fails for any other dtype rather
    /// than silently converting.
    pub fn to_f32s(&self) -> Result<Vec<f32>> {
        match self.dtype {
            DType::F32 => Ok(self
                .bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()),
            other => bail!("expected an f32 tensor, got {other}"),
        }
    }

    pub fn to_i64s(&self) -> Result<Vec<i64>> {
        match self.dtype {
            DType::I64 => Ok(self
                .bytes
                .chunks_exact(8)
                .map(|b| {
                    i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
                })
                .collect()),
            other => bail!("expected an i64 tensor, got {other}"),
        }
    }

    pub fn to_i32s(&self) -> Result<Vec<i32>> {
        match self.dtype {
            DType::I32 => Ok(self
                .bytes
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()),
            other => bail!("expected an i32 tensor, got {other}"),
        }
    }

    pub fn to_f64s(&self) -> Result<Vec<f64>> {
        match self.dtype {
            DType::F64 => Ok(self
                .bytes
                .chunks_exact(8)
                .map(|b| {
                    f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
                })
                .collect()),
            other => bail!("expected an f64 tensor, got {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_numel_and_leading() {
        let s = Shape::from_slice(&[2, 3, 4]);
        assert_eq!(s.rank(), 3);
        assert_eq!(s.numel(), 24);
        assert_eq!(s.leading(), 2);
        assert_eq!(Shape::from_slice(&[]).numel(), 1);
    }

    #[test]
    fn f32_round_trip() -> Result<()> {
        let data = [1.0f32, -2.5, 3.25];
        let t = Tensor::from_f32s(Shape::from_slice(&[3]), &data)?;
        assert_eq!(t.to_f32s()?, data);
        Ok(())
    }

    #[test]
    fn byte_length_mismatch_rejected() {
        let res = Tensor::from_bytes(
            DType::F32,
            Shape::from_slice(&[2]),
            Bytes::from_static(&[0u8; 4]),
        );
        assert!(res.is_err());
    }

    #[test]
    fn dtype_mismatch_rejected() -> Result<()> {
        let t = Tensor::from_i64s(Shape::from_slice(&[1]), &[7])?;
        assert!(t.to_f32s().is_err());
        Ok(())
    }
}

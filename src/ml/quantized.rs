// ============================================================
// Layer 5 — Quantized Inference Model
// ============================================================
// The trained classifier exported for inference only.
//
// Weights (embedding, convolution, dense, output) are stored as
// int8 with one f32 scale per tensor (symmetric, |w|max → 127);
// biases stay f32. At load time the int8 weights are expanded
// once into ndarray arrays and the forward pass runs on plain
// ndarray without the burn runtime.
//
// File layout (little-endian):
//
//   magic      b"LCQM"
//   version    u16                        (1)
//   header     u32 × 6                    max_len, vocab_rows, embedding_dim,
//                                         filters, kernel_size, hidden
//   embedding  qtensor [vocab_rows, embedding_dim]
//   conv.w     qtensor [filters, embedding_dim, kernel_size]
//   conv.b     f32vec  [filters]
//   dense.w    qtensor [filters, hidden]
//   dense.b    f32vec  [hidden]
//   output.w   qtensor [hidden, 1]
//   output.b   f32vec  [1]
//
//   qtensor := rank u8, dims u32 × rank, scale f32, len u32, i8 × len
//   f32vec  := len u32, f32 × len
//
// Input is the fixed [1, max_len] f32 row produced by
// SequenceEncoder::encode_f32; output is one f32 probability.

use anyhow::Result;
use burn::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{s, Array1, Array2, Array3, Axis};
use std::io::{Read, Write};
use thiserror::Error;

use crate::ml::model::LineClassifier;

const MAGIC: &[u8; 4] = b"LCQM";
const FORMAT_VERSION: u16 = 1;

#[derive(Debug, Error)]
pub enum QuantizedModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a quantized line classifier (bad magic)")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    #[error("tensor '{name}' has shape {found:?}, expected {expected:?}")]
    Shape { name: &'static str, expected: Vec<usize>, found: Vec<usize> },

    #[error("{0} trailing bytes after the last tensor")]
    TrailingBytes(usize),

    #[error("input has {found} values, expected [1, {expected}]")]
    InputLength { expected: usize, found: usize },

    #[error("input value {0} is not an index into {1} embedding rows")]
    InputIndex(f32, usize),
}

/// Fixed architecture numbers recorded in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub max_len:       usize,
    pub vocab_rows:    usize,
    pub embedding_dim: usize,
    pub filters:       usize,
    pub kernel_size:   usize,
    pub hidden:        usize,
}

/// Symmetric per-tensor int8 quantization.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedTensor {
    pub shape:  Vec<usize>,
    pub scale:  f32,
    pub values: Vec<i8>,
}

impl QuantizedTensor {
    pub fn quantize(shape: Vec<usize>, data: &[f32]) -> Self {
        let max_abs = data.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        let scale   = if max_abs > 0.0 { max_abs / 127.0 } else { 1.0 };
        let values  = data
            .iter()
            .map(|v| (v / scale).round().clamp(-127.0, 127.0) as i8)
            .collect();
        Self { shape, scale, values }
    }

    pub fn dequantize(&self) -> Vec<f32> {
        self.values.iter().map(|&q| q as f32 * self.scale).collect()
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u8(self.shape.len() as u8)?;
        for &d in &self.shape {
            w.write_u32::<LittleEndian>(d as u32)?;
        }
        w.write_f32::<LittleEndian>(self.scale)?;
        w.write_u32::<LittleEndian>(self.values.len() as u32)?;
        let bytes: Vec<u8> = self.values.iter().map(|&v| v as u8).collect();
        w.write_all(&bytes)
    }

    fn read_from<R: Read>(
        r:        &mut R,
        name:     &'static str,
        expected: &[usize],
    ) -> Result<Self, QuantizedModelError> {
        let rank = r.read_u8()? as usize;
        let mut shape = Vec::with_capacity(rank);
        for _ in 0..rank {
            shape.push(r.read_u32::<LittleEndian>()? as usize);
        }
        if shape != expected {
            return Err(QuantizedModelError::Shape { name, expected: expected.to_vec(), found: shape });
        }
        let scale = r.read_f32::<LittleEndian>()?;
        let len   = r.read_u32::<LittleEndian>()? as usize;
        if len != expected.iter().product::<usize>() {
            return Err(QuantizedModelError::Shape { name, expected: expected.to_vec(), found: vec![len] });
        }
        let mut values = vec![0i8; len];
        r.read_i8_into(&mut values)?;
        Ok(Self { shape, scale, values })
    }
}

fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> std::io::Result<()> {
    w.write_u32::<LittleEndian>(values.len() as u32)?;
    for &v in values {
        w.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

fn read_f32s<R: Read>(r: &mut R, name: &'static str, expected: usize) -> Result<Vec<f32>, QuantizedModelError> {
    let len = r.read_u32::<LittleEndian>()? as usize;
    if len != expected {
        return Err(QuantizedModelError::Shape { name, expected: vec![expected], found: vec![len] });
    }
    let mut values = vec![0f32; len];
    r.read_f32_into::<LittleEndian>(&mut values)?;
    Ok(values)
}

/// The serialisable export: header plus quantized tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedModel {
    pub header:   ModelHeader,
    pub embedding: QuantizedTensor,
    pub conv_w:   QuantizedTensor,
    pub conv_b:   Vec<f32>,
    pub dense_w:  QuantizedTensor,
    pub dense_b:  Vec<f32>,
    pub output_w: QuantizedTensor,
    pub output_b: Vec<f32>,
}

fn tensor_values<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<(Vec<usize>, Vec<f32>)> {
    let shape  = t.dims().to_vec();
    let values = t
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))?;
    Ok((shape, values))
}

fn bias_values<B: Backend>(
    bias: &Option<burn::module::Param<Tensor<B, 1>>>,
    len:  usize,
) -> Result<Vec<f32>> {
    match bias {
        Some(b) => Ok(tensor_values(b.val())?.1),
        None    => Ok(vec![0.0; len]),
    }
}

impl QuantizedModel {
    /// Quantize a trained classifier for a fixed `max_len` input.
    pub fn from_classifier<B: Backend>(model: &LineClassifier<B>, max_len: usize) -> Result<Self> {
        let (emb_shape, emb)     = tensor_values(model.embedding.weight.val())?;
        let (conv_shape, conv)   = tensor_values(model.conv.weight.val())?;
        let (dense_shape, dense) = tensor_values(model.dense.weight.val())?;
        let (out_shape, out)     = tensor_values(model.output.weight.val())?;

        let header = ModelHeader {
            max_len,
            vocab_rows:    emb_shape[0],
            embedding_dim: emb_shape[1],
            filters:       conv_shape[0],
            kernel_size:   conv_shape[2],
            hidden:        dense_shape[1],
        };
        if max_len < header.kernel_size {
            anyhow::bail!("max_len {} is shorter than kernel {}", max_len, header.kernel_size);
        }

        Ok(Self {
            header,
            embedding: QuantizedTensor::quantize(emb_shape, &emb),
            conv_w:    QuantizedTensor::quantize(conv_shape, &conv),
            conv_b:    bias_values(&model.conv.bias, header.filters)?,
            dense_w:   QuantizedTensor::quantize(dense_shape, &dense),
            dense_b:   bias_values(&model.dense.bias, header.hidden)?,
            output_w:  QuantizedTensor::quantize(out_shape, &out),
            output_b:  bias_values(&model.output.bias, 1)?,
        })
    }

    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let h = &self.header;
        w.write_all(MAGIC)?;
        w.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        for v in [h.max_len, h.vocab_rows, h.embedding_dim, h.filters, h.kernel_size, h.hidden] {
            w.write_u32::<LittleEndian>(v as u32)?;
        }
        self.embedding.write_to(w)?;
        self.conv_w.write_to(w)?;
        write_f32s(w, &self.conv_b)?;
        self.dense_w.write_to(w)?;
        write_f32s(w, &self.dense_b)?;
        self.output_w.write_to(w)?;
        write_f32s(w, &self.output_b)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, QuantizedModelError> {
        let mut r = bytes;

        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(QuantizedModelError::BadMagic);
        }
        let version = r.read_u16::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(QuantizedModelError::UnsupportedVersion(version));
        }

        let mut fields = [0usize; 6];
        for f in fields.iter_mut() {
            *f = r.read_u32::<LittleEndian>()? as usize;
        }
        let [max_len, vocab_rows, embedding_dim, filters, kernel_size, hidden] = fields;
        let header = ModelHeader { max_len, vocab_rows, embedding_dim, filters, kernel_size, hidden };
        if max_len < kernel_size || kernel_size == 0 {
            return Err(QuantizedModelError::Shape {
                name:     "header",
                expected: vec![kernel_size],
                found:    vec![max_len],
            });
        }

        let embedding = QuantizedTensor::read_from(&mut r, "embedding", &[vocab_rows, embedding_dim])?;
        let conv_w    = QuantizedTensor::read_from(&mut r, "conv.weight", &[filters, embedding_dim, kernel_size])?;
        let conv_b    = read_f32s(&mut r, "conv.bias", filters)?;
        let dense_w   = QuantizedTensor::read_from(&mut r, "dense.weight", &[filters, hidden])?;
        let dense_b   = read_f32s(&mut r, "dense.bias", hidden)?;
        let output_w  = QuantizedTensor::read_from(&mut r, "output.weight", &[hidden, 1])?;
        let output_b  = read_f32s(&mut r, "output.bias", 1)?;

        if !r.is_empty() {
            return Err(QuantizedModelError::TrailingBytes(r.len()));
        }

        Ok(Self { header, embedding, conv_w, conv_b, dense_w, dense_b, output_w, output_b })
    }
}

/// Runtime form: dequantized ndarray weights and a plain forward pass.
#[derive(Debug, Clone)]
pub struct QuantizedLineClassifier {
    header:    ModelHeader,
    embedding: Array2<f32>, // [vocab_rows, dim]
    conv_w:    Array3<f32>, // [filters, dim, kernel]
    conv_b:    Array1<f32>, // [filters]
    dense_w:   Array2<f32>, // [filters, hidden]
    dense_b:   Array1<f32>, // [hidden]
    output_w:  Array2<f32>, // [hidden, 1]
    output_b:  f32,
}

fn array2(t: &QuantizedTensor) -> Result<Array2<f32>, QuantizedModelError> {
    Array2::from_shape_vec((t.shape[0], t.shape[1]), t.dequantize()).map_err(|_| {
        QuantizedModelError::Shape { name: "tensor", expected: t.shape.clone(), found: vec![t.values.len()] }
    })
}

impl QuantizedLineClassifier {
    pub fn new(model: &QuantizedModel) -> Result<Self, QuantizedModelError> {
        let c = &model.conv_w;
        let conv_w = Array3::from_shape_vec((c.shape[0], c.shape[1], c.shape[2]), c.dequantize())
            .map_err(|_| QuantizedModelError::Shape {
                name:     "conv.weight",
                expected: c.shape.clone(),
                found:    vec![c.values.len()],
            })?;

        Ok(Self {
            header:    model.header,
            embedding: array2(&model.embedding)?,
            conv_w,
            conv_b:    Array1::from_vec(model.conv_b.clone()),
            dense_w:   array2(&model.dense_w)?,
            dense_b:   Array1::from_vec(model.dense_b.clone()),
            output_w:  array2(&model.output_w)?,
            output_b:  model.output_b.first().copied().unwrap_or(0.0),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, QuantizedModelError> {
        Self::new(&QuantizedModel::from_bytes(bytes)?)
    }

    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    /// One forward pass over a `[1, max_len]` f32 input row.
    pub fn predict(&self, input: &[f32]) -> Result<f32, QuantizedModelError> {
        let h = &self.header;
        if input.len() != h.max_len {
            return Err(QuantizedModelError::InputLength { expected: h.max_len, found: input.len() });
        }

        // embedding lookup → [max_len, dim]
        let mut x = Array2::<f32>::zeros((h.max_len, h.embedding_dim));
        for (t, &value) in input.iter().enumerate() {
            let in_range = value.is_finite() && value >= 0.0 && (value as usize) < h.vocab_rows;
            if !in_range || value.fract() != 0.0 {
                return Err(QuantizedModelError::InputIndex(value, h.vocab_rows));
            }
            x.row_mut(t).assign(&self.embedding.row(value as usize));
        }

        // valid conv1d as a sum of per-tap matmuls → [filters, out_len]
        let out_len = h.max_len - h.kernel_size + 1;
        let xt      = x.t();
        let mut acc = Array2::<f32>::zeros((h.filters, out_len));
        for k in 0..h.kernel_size {
            let wk = self.conv_w.index_axis(Axis(2), k);
            acc += &wk.dot(&xt.slice(s![.., k..k + out_len]));
        }
        acc += &self.conv_b.view().insert_axis(Axis(1));
        acc.mapv_inplace(|v| v.max(0.0));

        // global max-pool over time → [filters]
        let pooled = acc.fold_axis(Axis(1), f32::NEG_INFINITY, |&m, &v| m.max(v));

        let mut hidden = pooled.dot(&self.dense_w) + &self.dense_b;
        hidden.mapv_inplace(|v| v.max(0.0));

        let logit = hidden.dot(&self.output_w)[0] + self.output_b;
        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}

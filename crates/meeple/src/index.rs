//! Exact nearest-neighbor search over embedding vectors.
//!
//! [`FlatIndex`] is a brute-force index that reads and writes the FAISS flat
//! index binary layout, so indices built offline with `faiss.write_index` on
//! an `IndexFlatL2` / `IndexFlatIP` load directly:
//!
//! ```text
//! fourcc[4]        "IxF2" (L2) or "IxFI" (inner product)
//! d: i32           vector dimension
//! ntotal: i64      number of vectors
//! dummy: i64 ×2    unused (1 << 20)
//! is_trained: u8
//! metric_type: i32 (0 = inner product, 1 = L2)
//! metric_arg: f32  only when metric_type > 1
//! n_floats: u64    must equal d * ntotal
//! floats: f32 × n_floats
//! ```
//!
//! All integers are little-endian. Like FAISS, a search for more neighbors
//! than the index holds pads the result with position `-1`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

const FOURCC_L2: &[u8; 4] = b"IxF2";
const FOURCC_IP: &[u8; 4] = b"IxFI";
const METRIC_INNER_PRODUCT: i32 = 0;
const METRIC_L2: i32 = 1;
const HEADER_DUMMY: i64 = 1 << 20;

/// Errors from reading, writing, or querying a vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported index type {0:?}; only flat L2/IP indices are readable")]
    UnsupportedType(String),
    #[error("unsupported metric type {0}")]
    UnsupportedMetric(i32),
    #[error("corrupt index: {0}")]
    Corrupt(String),
    #[error("dimension mismatch: index has {expected}, vector has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Distance metric of a flat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared Euclidean distance (FAISS reports squared L2).
    L2,
    /// Inner product. Reported as negated similarity so that ascending
    /// distance still means "best first".
    InnerProduct,
}

/// One search hit: distance and position in the indexed arrays.
///
/// `position` is signed because FAISS pads short results with `-1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f32,
    pub position: i64,
}

impl Neighbor {
    /// Position as an array index, if it is non-negative.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.position).ok()
    }
}

/// Nearest-neighbor search contract used by retrieval.
///
/// Results are ordered by ascending distance. No score threshold is applied.
pub trait VectorIndex: Send + Sync {
    /// Vector dimension.
    fn dimension(&self) -> usize;
    /// Number of indexed vectors.
    fn len(&self) -> usize;
    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Return the `k` nearest neighbors of `query`.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError>;
}

/// Brute-force index over a contiguous `f32` buffer.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: Metric,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index.
    pub fn new(dimension: usize, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            data: Vec::new(),
        }
    }

    /// Build an index from a list of vectors. All vectors must share the
    /// dimension of the first.
    pub fn from_vectors(metric: Metric, vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let dimension = vectors.first().map_or(0, Vec::len);
        let mut index = Self::new(dimension, metric);
        for v in vectors {
            index.add(v)?;
        }
        Ok(index)
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Append one vector.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    fn vector(&self, i: usize) -> &[f32] {
        &self.data[i * self.dimension..(i + 1) * self.dimension]
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Metric::InnerProduct => -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
        }
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Read a FAISS flat index file.
    pub fn read(path: &Path) -> Result<Self, IndexError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Read a FAISS flat index from any byte stream.
    pub fn read_from(mut r: impl Read) -> Result<Self, IndexError> {
        let mut fourcc = [0u8; 4];
        r.read_exact(&mut fourcc)?;
        let fourcc_metric = match &fourcc {
            FOURCC_L2 => Metric::L2,
            FOURCC_IP => Metric::InnerProduct,
            other => {
                return Err(IndexError::UnsupportedType(
                    String::from_utf8_lossy(other).into_owned(),
                ));
            }
        };

        let d = read_i32(&mut r)?;
        let ntotal = read_i64(&mut r)?;
        let _dummy = read_i64(&mut r)?;
        let _dummy = read_i64(&mut r)?;
        let mut is_trained = [0u8; 1];
        r.read_exact(&mut is_trained)?;
        let metric_type = read_i32(&mut r)?;
        if metric_type > 1 {
            let mut metric_arg = [0u8; 4];
            r.read_exact(&mut metric_arg)?;
        }
        let metric = match metric_type {
            METRIC_L2 => Metric::L2,
            METRIC_INNER_PRODUCT => Metric::InnerProduct,
            other => return Err(IndexError::UnsupportedMetric(other)),
        };
        if metric != fourcc_metric {
            return Err(IndexError::Corrupt(format!(
                "fourcc says {fourcc_metric:?} but header says {metric:?}"
            )));
        }

        let dimension = usize::try_from(d)
            .map_err(|_| IndexError::Corrupt(format!("negative dimension {d}")))?;
        let count = usize::try_from(ntotal)
            .map_err(|_| IndexError::Corrupt(format!("negative vector count {ntotal}")))?;
        let n_floats = usize::try_from(read_u64(&mut r)?)
            .map_err(|_| IndexError::Corrupt("vector payload too large".into()))?;
        if Some(n_floats) != dimension.checked_mul(count) {
            return Err(IndexError::Corrupt(format!(
                "payload holds {n_floats} floats, expected {dimension} x {count}"
            )));
        }

        let mut bytes = vec![0u8; n_floats * 4];
        r.read_exact(&mut bytes)?;
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            dimension,
            metric,
            data,
        })
    }

    /// Write the index in FAISS flat layout.
    pub fn write(&self, path: &Path) -> Result<(), IndexError> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Write the index in FAISS flat layout to any byte sink.
    pub fn write_to(&self, mut w: impl Write) -> Result<(), IndexError> {
        let (fourcc, metric_type) = match self.metric {
            Metric::L2 => (FOURCC_L2, METRIC_L2),
            Metric::InnerProduct => (FOURCC_IP, METRIC_INNER_PRODUCT),
        };
        w.write_all(fourcc)?;
        w.write_all(&(self.dimension as i32).to_le_bytes())?;
        w.write_all(&(self.len() as i64).to_le_bytes())?;
        w.write_all(&HEADER_DUMMY.to_le_bytes())?;
        w.write_all(&HEADER_DUMMY.to_le_bytes())?;
        w.write_all(&[1u8])?;
        w.write_all(&metric_type.to_le_bytes())?;
        w.write_all(&(self.data.len() as u64).to_le_bytes())?;
        for x in &self.data {
            w.write_all(&x.to_le_bytes())?;
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<Neighbor> = (0..self.len())
            .map(|i| Neighbor {
                distance: self.distance(query, self.vector(i)),
                position: i as i64,
            })
            .collect();
        // Stable sort keeps lower positions first on equal distance.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);

        while hits.len() < k {
            hits.push(Neighbor {
                distance: f32::MAX,
                position: -1,
            });
        }
        Ok(hits)
    }
}

fn read_i32(r: &mut impl Read) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64(r: &mut impl Read) -> std::io::Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(x: f32, y: f32) -> Vec<f32> {
        let n = (x * x + y * y).sqrt();
        vec![x / n, y / n]
    }

    #[test]
    fn l2_search_orders_by_ascending_distance() {
        let index =
            FlatIndex::from_vectors(Metric::L2, &[unit(1.0, 0.0), unit(0.0, 1.0), unit(1.0, 1.0)])
                .unwrap();
        let hits = index.search(&unit(1.0, 0.1), 3).unwrap();
        let positions: Vec<i64> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 2, 1]);
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn inner_product_best_match_first() {
        let index = FlatIndex::from_vectors(
            Metric::InnerProduct,
            &[unit(0.0, 1.0), unit(1.0, 0.0)],
        )
        .unwrap();
        let hits = index.search(&unit(1.0, 0.0), 1).unwrap();
        assert_eq!(hits[0].position, 1);
        assert!(hits[0].distance < 0.0);
    }

    #[test]
    fn short_index_pads_with_minus_one() {
        let index = FlatIndex::from_vectors(Metric::L2, &[unit(1.0, 0.0)]).unwrap();
        let hits = index.search(&unit(1.0, 0.0), 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, -1);
        assert_eq!(hits[2].index(), None);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let index = FlatIndex::from_vectors(Metric::L2, &[vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn file_roundtrip_preserves_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game_index.faiss");
        let index = FlatIndex::from_vectors(
            Metric::InnerProduct,
            &[unit(1.0, 0.0), unit(0.0, 1.0)],
        )
        .unwrap();
        index.write(&path).unwrap();

        let loaded = FlatIndex::read(&path).unwrap();
        assert_eq!(loaded.dimension(), 2);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.metric(), Metric::InnerProduct);
        assert_eq!(
            loaded.search(&unit(0.1, 1.0), 1).unwrap()[0].position,
            1
        );
    }

    #[test]
    fn header_layout_matches_faiss() {
        let index = FlatIndex::from_vectors(Metric::L2, &[vec![0.5, 0.25]]).unwrap();
        let mut bytes = Vec::new();
        index.write_to(&mut bytes).unwrap();
        // fourcc + d + ntotal + 2 dummies + is_trained + metric + n_floats + payload
        assert_eq!(bytes.len(), 4 + 4 + 8 + 16 + 1 + 4 + 8 + 8);
        assert_eq!(&bytes[..4], b"IxF2");
        assert_eq!(i32::from_le_bytes(bytes[4..8].try_into().unwrap()), 2);
        assert_eq!(i64::from_le_bytes(bytes[8..16].try_into().unwrap()), 1);
    }

    #[test]
    fn foreign_index_type_is_rejected() {
        let bytes = b"IHNfxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
        assert!(matches!(
            FlatIndex::read_from(&bytes[..]),
            Err(IndexError::UnsupportedType(_))
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let index = FlatIndex::from_vectors(Metric::L2, &[vec![1.0, 2.0]]).unwrap();
        let mut bytes = Vec::new();
        index.write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 2);
        assert!(FlatIndex::read_from(&bytes[..]).is_err());
    }
}

use super::TargetLoader;
use crate::codec;
use crate::error::PipelineError;
use crate::matrix::LabelMatrix;

/// Decodes as single-channel 8-bit, then remaps each byte through a fixed
/// 256-entry lookup table.
#[derive(Debug, Clone)]
pub struct ValueMapperLoader {
    table: Box<[u8; 256]>,
}

impl ValueMapperLoader {
    pub fn new(table: impl Into<Vec<u8>>) -> Result<Self, PipelineError> {
        let table = table.into();
        if table.len() != 256 {
            return Err(PipelineError::Config(format!(
                "value mapper table must have exactly 256 entries, got {}",
                table.len()
            )));
        }
        let mut fixed = [0u8; 256];
        fixed.copy_from_slice(&table);
        Ok(Self {
            table: Box::new(fixed),
        })
    }
}

impl TargetLoader for ValueMapperLoader {
    fn load(&self, path: &str) -> Result<LabelMatrix, PipelineError> {
        let img = codec::decode_gray(path)?;
        let (width, height) = (img.width() as usize, img.height() as usize);
        let data = img
            .into_raw()
            .into_iter()
            .map(|v| self.table[v as usize])
            .collect();
        Ok(LabelMatrix::new(data, height, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length_table() {
        assert!(ValueMapperLoader::new(vec![0u8; 10]).is_err());
        assert!(ValueMapperLoader::new(vec![0u8; 256]).is_ok());
    }
}

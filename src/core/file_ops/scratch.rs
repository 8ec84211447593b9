use tempfile::TempDir;
use std::path::{Path, PathBuf};
use std::fs;
use crate::models::{SourceFile, SqueezeError};

/// Scratch directory for one engine invocation
///
/// Holds the mounted input and the engine's output side by side:
/// - `input.<ext>`  - copy of the source payload
/// - `output.<ext>` - file the engine writes
///
/// Removed with everything in it when dropped, whether the invocation
/// succeeded, failed or unwound.
pub struct ScratchDir {
    temp_dir: TempDir,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl ScratchDir {
    /// Create a scratch directory for one file
    ///
    /// # Arguments
    /// * `label` - Used in the directory prefix to ease debugging
    /// * `input_ext` - Extension for the mounted input (engines sniff it)
    /// * `output_ext` - Extension the engine derives the output container from
    pub fn new(label: &str, input_ext: &str, output_ext: &str) -> Result<Self, SqueezeError> {
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("squeeze_{}_", sanitize_label(label)))
            .tempdir()
            .map_err(|e| SqueezeError::Transcode(
                format!("Failed to create scratch directory: {}", e)
            ))?;

        let base_path = temp_dir.path();
        let input_path = base_path.join(format!("input.{}", input_ext));
        let output_path = base_path.join(format!("output.{}", output_ext));

        Ok(Self {
            temp_dir,
            input_path,
            output_path,
        })
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn base_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Copy the source payload into the input slot
    pub fn mount(&self, source: &SourceFile) -> Result<(), SqueezeError> {
        source.write_to(&self.input_path).map_err(|e| SqueezeError::Transcode(
            format!("Failed to mount {}: {}", source.name(), e)
        ))
    }

    /// Read back what the engine produced
    pub fn read_output(&self) -> Result<Vec<u8>, SqueezeError> {
        let bytes = fs::read(&self.output_path).map_err(|e| SqueezeError::Transcode(
            format!("Failed to read output {}: {}", self.output_path.display(), e)
        ))?;

        if bytes.is_empty() {
            return Err(SqueezeError::Transcode("Engine produced an empty file".to_string()));
        }
        Ok(bytes)
    }
}

// Keeps ids and odd file names from producing path separators in the prefix
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(32)
        .collect()
}


use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};
use crate::dictionary::Dictionary;
use crate::errors::Result;

// every persisted item picks its own extension, callers pass paths without it

pub fn read_input<R: ReadFile>(file_path: &str) -> Result<R> {
    R::read_file(file_path)
}

pub fn save_output<S: SaveFile>(output_dir: &str, file_name: &str, item: &S) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    item.save_file(output_dir, file_name)
}

fn with_extension(file_path: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", file_path, extension))
}

fn output_path(output_dir: &str, file_name: &str, extension: &str) -> PathBuf {
    Path::new(output_dir).join(format!("{}.{}", file_name, extension))
}


pub trait ReadFile: Sized {
    fn read_file(file_path: &str) -> Result<Self>;
}

pub trait SaveFile {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()>;
}

impl ReadFile for Array2<f32> {
    fn read_file(file_path: &str) -> Result<Self> {
        Ok(read_npy(with_extension(file_path, "npy"))?)
    }
}

impl SaveFile for Array2<f32> {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
        write_npy(output_path(output_dir, file_name, "npy"), self)?;
        Ok(())
    }
}

// tokens, in the order of the rows of the matching npy file
impl ReadFile for Vec<String> {
    fn read_file(file_path: &str) -> Result<Self> {
        let f = BufReader::new(File::open(with_extension(file_path, "json"))?);
        Ok(serde_json::from_reader(f)?)
    }
}

impl SaveFile for Vec<String> {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
        let mut f = BufWriter::new(File::create(output_path(output_dir, file_name, "json"))?);
        serde_json::to_writer(&mut f, self)?;
        f.flush()?;
        Ok(())
    }
}

impl ReadFile for Dictionary {
    fn read_file(file_path: &str) -> Result<Self> {
        let f = BufReader::new(File::open(with_extension(file_path, "bin.gz"))?);
        let reader = GzDecoder::new(f);
        Ok(bincode::deserialize_from(reader)?)
    }
}

impl SaveFile for Dictionary {
    fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
        let f = BufWriter::new(File::create(output_path(output_dir, file_name, "bin.gz"))?);
        let mut writer = GzEncoder::new(f, Compression::default());
        bincode::serialize_into(&mut writer, self)?;
        writer.finish()?.flush()?;
        Ok(())
    }
}

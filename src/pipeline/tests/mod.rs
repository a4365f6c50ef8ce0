//! Orchestration tests for the pipeline module
//!
//! Each test builds a throwaway source directory and reference files under a
//! `TempDir` and runs the full pipeline against them.


use super::{Pipeline, PipelineInputs};
use crate::config::EtlConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const EQUIPMENT_MASTER: &[u8] =
    b"Fabricante;Familia;Referencia;Tecnologia;Llave\nACME;Router;R-100;GPON;@A1\nZETA;Modem;M-200;HFC;B2\n";

pub const TECHNICAL_LOCATIONS: &[u8] =
    b"ID;ESTADO;TIPOLOGIA_RED;OPERA;ALIADO_ZONIFICADO\nN1;Activo;FTTH;SI;ALIADO_NORTE\nN2;Inactivo;HFC;NO;ALIADO_SUR\n";

/// Workspace with `source/` and `output/` directories
pub struct Workspace {
    pub temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("source")).unwrap();
        Self { temp_dir }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.temp_dir.path().join("source")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("output")
    }

    pub fn write_source(&self, name: &str, contents: impl AsRef<[u8]>) {
        fs::write(self.source_dir().join(name), contents).unwrap();
    }

    pub fn write_reference(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn inputs(&self) -> PipelineInputs {
        PipelineInputs {
            source_dir: self.source_dir(),
            output_dir: self.output_dir(),
            equipment_master: None,
            technical_locations: None,
        }
    }
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(EtlConfig::default().without_progress())
}

pub fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

use crate::block::{BasicBlock, BlockId};
use crate::cfg::Cfg;
use crate::vars::DeclMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// On-disk form of a function's CFG plus its declaration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgFile {
    pub decls: DeclMap,
    pub entry: BlockId,
    pub blocks: Vec<BasicBlock>,
}

impl CfgFile {
    pub fn from_parts(cfg: &Cfg, decls: &DeclMap) -> Self {
        Self {
            decls: decls.clone(),
            entry: cfg.entry(),
            blocks: cfg.blocks().cloned().collect(),
        }
    }

    pub fn into_parts(self) -> (Cfg, DeclMap) {
        (Cfg::new(self.blocks, self.entry), self.decls)
    }
}

pub fn save_cfg(cfg: &Cfg, decls: &DeclMap, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&CfgFile::from_parts(cfg, decls))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    fs::write(path, json)?;
    Ok(())
}

pub fn load_cfg(path: impl AsRef<Path>) -> io::Result<(Cfg, DeclMap)> {
    let json = fs::read_to_string(path)?;
    let file: CfgFile =
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    Ok(file.into_parts())
}

// src/db/slot_storage.rs

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        RwLock,
    },
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("falha ao ler o slot '{slot}': {source}")]
    Read { slot: String, source: io::Error },

    #[error("falha ao gravar o slot '{slot}': {source}")]
    Write { slot: String, source: io::Error },

    #[error("falha ao serializar o slot '{slot}': {source}")]
    Encode {
        slot: String,
        source: serde_json::Error,
    },
}

/// Armazenamento durável chave -> JSON, um valor inteiro por chave.
/// Não há escrita parcial: `set` substitui o conteúdo do slot.
pub trait SlotStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ---
// Arquivo: um `<chave>.json` por slot dentro de DATA_DIR
// ---
pub struct FileSlotStorage {
    dir: PathBuf,
}

impl FileSlotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SlotStorage for FileSlotStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { slot: key.to_string(), source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write { slot: key.to_string(), source };

        // Grava num temporário e renomeia: o slot nunca fica pela metade
        let target = self.path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &target).map_err(write_err)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write { slot: key.to_string(), source }),
        }
    }
}

// ---
// Memória: testes e execução efêmera
// ---
#[derive(Default)]
pub struct MemorySlotStorage {
    slots: RwLock<HashMap<String, String>>,
    read_only: AtomicBool,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula disco cheio: toda escrita passa a falhar.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                slot: key.to_string(),
                source: io::Error::new(io::ErrorKind::StorageFull, "armazenamento somente leitura"),
            });
        }
        Ok(())
    }
}

impl SlotStorage for MemorySlotStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(key);
        Ok(())
    }
}

// src/db/local_store.rs

//! Coleção local de registros, gravada inteira num slot a cada mutação.
//!
//! Cada operação faz ler-modificar-gravar da coleção completa sob um mutex,
//! então as mutações de um mesmo tipo são estritamente sequenciais. Leitura
//! nunca falha para quem chama: slot ausente ou que não é uma lista vira
//! coleção vazia. Um elemento isolado que não decodifica é pulado na leitura
//! e regravado intacto no fim da lista, nunca descartado.
//!
//! Chaves: `companies` e `employees` quando o armazenamento é de um único
//! dono (`LocalStore::new`). No servidor cada negócio tem o próprio par de
//! slots, `<business_id>.companies` e `<business_id>.employees`
//! (`LocalStore::scoped`, via `ScopedStores`).

use std::{
    collections::HashMap,
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    db::slot_storage::{SlotStorage, StoreError},
    models::{company::Company, employee::Employee},
};

pub trait LocalRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Chave fixa do slot. Não muda entre versões.
    const SLOT: &'static str;

    fn id(&self) -> Uuid;
}

impl LocalRecord for Company {
    const SLOT: &'static str = "companies";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl LocalRecord for Employee {
    const SLOT: &'static str = "employees";

    fn id(&self) -> Uuid {
        self.id
    }
}

// Conteúdo lido: registros válidos e elementos que não decodificaram
struct Slot<T> {
    records: Vec<T>,
    unreadable: Vec<Value>,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self { records: Vec::new(), unreadable: Vec::new() }
    }
}

pub struct LocalStore<T> {
    storage: Arc<dyn SlotStorage>,
    key: String,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: LocalRecord> LocalStore<T> {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self::with_key(storage, T::SLOT.to_string())
    }

    /// Coleção de um negócio: `<business_id>.<slot>`.
    pub fn scoped(storage: Arc<dyn SlotStorage>, business_id: Uuid) -> Self {
        Self::with_key(storage, format!("{business_id}.{}", T::SLOT))
    }

    fn with_key(storage: Arc<dyn SlotStorage>, key: String) -> Self {
        Self {
            storage,
            key,
            lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // O mutex não protege dados, só serializa; envenenamento é irrelevante
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_slot(&self) -> Result<Slot<T>, StoreError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Slot::empty());
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("Slot '{}' não contém uma lista, usando coleção vazia", self.key);
                return Ok(Slot::empty());
            }
            Err(e) => {
                tracing::warn!("Slot '{}' com conteúdo inválido, usando coleção vazia: {}", self.key, e);
                return Ok(Slot::empty());
            }
        };

        let mut slot = Slot::empty();
        for item in items {
            match serde_json::from_value::<T>(item.clone()) {
                Ok(record) => slot.records.push(record),
                Err(e) => {
                    tracing::warn!("Registro ilegível no slot '{}' mantido como está: {}", self.key, e);
                    slot.unreadable.push(item);
                }
            }
        }
        Ok(slot)
    }

    fn encode(&self, records: &[T], unreadable: &[Value]) -> Result<String, StoreError> {
        let encode_err = |source: serde_json::Error| StoreError::Encode { slot: self.key.clone(), source };

        let mut items = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(encode_err)?;
        items.extend(unreadable.iter().cloned());

        serde_json::to_string(&items).map_err(encode_err)
    }

    fn write_slot(&self, slot: &Slot<T>) -> Result<(), StoreError> {
        let raw = self.encode(&slot.records, &slot.unreadable)?;
        self.storage.set(&self.key, &raw)
    }

    /// Coleção atual, mais novo primeiro.
    pub fn load(&self) -> Vec<T> {
        let _guard = self.guard();
        match self.read_slot() {
            Ok(slot) => slot.records,
            Err(e) => {
                tracing::warn!("Slot '{}' ilegível, usando coleção vazia: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Substitui o conteúdo do slot pela coleção inteira.
    pub fn persist(&self, records: &[T]) -> Result<(), StoreError> {
        let _guard = self.guard();
        let raw = self.encode(records, &[])?;
        self.storage.set(&self.key, &raw)
    }

    /// Conteúdo bruto do slot, para desfazer uma gravação com `restore`.
    pub fn snapshot(&self) -> Result<Option<String>, StoreError> {
        let _guard = self.guard();
        self.storage.get(&self.key)
    }

    pub fn restore(&self, snapshot: Option<String>) -> Result<(), StoreError> {
        let _guard = self.guard();
        match snapshot {
            Some(raw) => self.storage.set(&self.key, &raw),
            None => self.storage.remove(&self.key),
        }
    }

    /// Remove o slot do armazenamento.
    pub fn discard(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.storage.remove(&self.key)
    }

    pub fn get(&self, id: Uuid) -> Option<T> {
        self.load().into_iter().find(|r| r.id() == id)
    }

    /// Gera id e data de criação, insere no topo e grava.
    pub fn create_with<F>(&self, build: F) -> Result<T, StoreError>
    where
        F: FnOnce(Uuid, DateTime<Utc>) -> T,
    {
        let _guard = self.guard();
        let mut slot = self.read_slot()?;

        let mut id = Uuid::new_v4();
        while slot.records.iter().any(|r| r.id() == id) {
            id = Uuid::new_v4();
        }

        let record = build(id, Utc::now());
        slot.records.insert(0, record.clone());
        self.write_slot(&slot)?;

        Ok(record)
    }

    /// `Ok(None)` quando o id não existe (nada é gravado).
    pub fn update<F>(&self, id: Uuid, apply: F) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&mut T),
    {
        let _guard = self.guard();
        let mut slot = self.read_slot()?;

        let Some(record) = slot.records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        apply(record);
        let updated = record.clone();

        self.write_slot(&slot)?;
        Ok(Some(updated))
    }

    /// Devolve `false` quando o id não existe.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let mut slot = self.read_slot()?;

        let before = slot.records.len();
        slot.records.retain(|r| r.id() != id);
        if slot.records.len() == before {
            return Ok(false);
        }

        self.write_slot(&slot)?;
        Ok(true)
    }

    /// Busca por substring sem diferenciar maiúsculas, na ordem da coleção.
    /// Consulta vazia devolve tudo.
    pub fn search_by<F>(&self, query: &str, haystack: F) -> Vec<T>
    where
        F: Fn(&T) -> String,
    {
        let records = self.load();
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return records;
        }

        records
            .into_iter()
            .filter(|r| haystack(r).to_lowercase().contains(&needle))
            .collect()
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.write_slot(&Slot::empty())
    }

    /// Acrescenta ao fim os registros cujo id ainda não existe; devolve quantos entraram.
    pub fn append_missing(&self, incoming: Vec<T>) -> Result<usize, StoreError> {
        let _guard = self.guard();
        let mut slot = self.read_slot()?;

        let mut added = 0;
        for record in incoming {
            if slot.records.iter().any(|r| r.id() == record.id()) {
                continue;
            }
            slot.records.push(record);
            added += 1;
        }

        if added > 0 {
            self.write_slot(&slot)?;
        }
        Ok(added)
    }
}

/// Uma `LocalStore` por negócio, criada na primeira vez que é pedida.
pub struct ScopedStores<T> {
    storage: Arc<dyn SlotStorage>,
    stores: Mutex<HashMap<Uuid, Arc<LocalStore<T>>>>,
}

impl<T: LocalRecord> ScopedStores<T> {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self {
            storage,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn for_business(&self, business_id: Uuid) -> Arc<LocalStore<T>> {
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        stores
            .entry(business_id)
            .or_insert_with(|| Arc::new(LocalStore::scoped(self.storage.clone(), business_id)))
            .clone()
    }

    /// Apaga a coleção do negócio e esquece a store em cache.
    pub fn remove_business(&self, business_id: Uuid) -> Result<(), StoreError> {
        let store = self.for_business(business_id);
        store.discard()?;

        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        stores.remove(&business_id);
        Ok(())
    }
}

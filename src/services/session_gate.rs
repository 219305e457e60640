// src/services/session_gate.rs

//! Portão de sessão: acompanha em tempo real o flag de aprovação de um perfil.
//!
//! A assinatura do feed é feita antes da leitura inicial, então nenhuma
//! mudança entre as duas se perde. Depois de `close()` (ou do drop) nenhuma
//! atualização atrasada chega aos observadores.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use uuid::Uuid;

use crate::{
    db::backend::{with_timeout, Backend},
    models::profile::{ProfileChange, UserProfile},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    Loading,
    Granted,
    AwaitingApproval,
    /// Perfil excluído ou sessão inválida: o cliente deve sair e voltar ao login.
    SignedOut,
}

impl GateState {
    pub fn for_profile(profile: &UserProfile) -> Self {
        if profile.approved {
            GateState::Granted
        } else {
            GateState::AwaitingApproval
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GateState::SignedOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GateState::Loading => "LOADING",
            GateState::Granted => "GRANTED",
            GateState::AwaitingApproval => "AWAITING_APPROVAL",
            GateState::SignedOut => "SIGNED_OUT",
        }
    }
}

pub struct SessionGate {
    profile_id: Uuid,
    receiver: watch::Receiver<GateState>,
    generation: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

// Publica só se o portão ainda estiver na mesma geração
struct Publisher {
    sender: watch::Sender<GateState>,
    generation: Arc<AtomicU64>,
    opened_at: u64,
}

impl Publisher {
    fn publish(&self, state: GateState) -> bool {
        if self.generation.load(Ordering::SeqCst) != self.opened_at {
            return false;
        }
        // Mesmo estado duas vezes não gera notificação
        self.sender.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        true
    }
}

impl SessionGate {
    pub fn open(backend: Arc<dyn Backend>, profile_id: Uuid, timeout: Duration) -> Self {
        let (sender, receiver) = watch::channel(GateState::Loading);
        let generation = Arc::new(AtomicU64::new(0));

        let publisher = Publisher {
            sender,
            generation: generation.clone(),
            opened_at: generation.load(Ordering::SeqCst),
        };

        // 1. Assina antes de ler
        let mut subscription = backend.subscribe_profile(profile_id);

        let task = tokio::spawn(async move {
            // 2. Estado inicial
            let initial = match with_timeout(timeout, backend.get_profile(profile_id)).await {
                Ok(Some(profile)) => GateState::for_profile(&profile),
                Ok(None) => GateState::SignedOut,
                Err(e) => {
                    tracing::warn!("Falha ao carregar o perfil {}: {}", profile_id, e);
                    GateState::SignedOut
                }
            };
            if !publisher.publish(initial) || initial.is_terminal() {
                return;
            }

            // 3. Mudanças em tempo real, até o perfil sumir ou ninguém mais observar
            loop {
                let change = tokio::select! {
                    change = subscription.next() => change,
                    _ = publisher.sender.closed() => return,
                };

                let state = match change {
                    Some(ProfileChange::Updated(profile)) => GateState::for_profile(&profile),
                    Some(ProfileChange::Deleted(_)) | None => GateState::SignedOut,
                };

                if !publisher.publish(state) || state.is_terminal() {
                    return;
                }
            }
        });

        Self {
            profile_id,
            receiver,
            generation,
            task,
        }
    }

    pub fn profile_id(&self) -> Uuid {
        self.profile_id
    }

    pub fn current(&self) -> GateState {
        *self.receiver.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<GateState> {
        self.receiver.clone()
    }

    /// Espera até o estado deixar de ser `Loading`.
    pub async fn settled(&self) -> GateState {
        let mut receiver = self.watch();
        match receiver.wait_for(|s| *s != GateState::Loading).await {
            Ok(state) => *state,
            Err(_) => GateState::SignedOut,
        }
    }

    /// Descarta atualizações pendentes e cancela a assinatura.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.task.abort();
    }

    /// Stream de estados (o atual primeiro). O portão vive enquanto o stream viver.
    pub fn into_stream(self) -> impl Stream<Item = GateState> + Send + 'static {
        WatchStream::new(self.watch()).map(move |state| {
            let _gate = &self;
            state
        })
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.close();
    }
}

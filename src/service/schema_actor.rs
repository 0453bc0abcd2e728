use crate::db::SqlitePool;
use crate::error::GalleryError;
use crate::listing::{Ident, ensure_columns};

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Messages handled by the schema actor.
#[derive(Debug)]
pub enum SchemaActorMessage {
    /// Make sure every column exists on the table; reply with those added.
    EnsureColumns(Ident, Vec<Ident>, RpcReplyPort<Result<Vec<Ident>, GalleryError>>),
}

/// Handle for interacting with the schema actor.
#[derive(Clone)]
pub struct SchemaHandle {
    actor: ActorRef<SchemaActorMessage>,
}

impl SchemaHandle {
    /// Serialised `ensure_columns`: concurrent requests never interleave
    /// their check-then-alter sequences.
    pub async fn ensure_columns(
        &self,
        table: Ident,
        columns: Vec<Ident>,
    ) -> Result<Vec<Ident>, GalleryError> {
        ractor::call!(
            self.actor,
            SchemaActorMessage::EnsureColumns,
            table,
            columns
        )
        .map_err(|e| GalleryError::RactorError(format!("EnsureColumns RPC failed: {e}")))?
    }
}

struct SchemaActorState {
    pool: SqlitePool,
    /// Columns confirmed present. Columns are never dropped, so this only grows.
    known: HashMap<Ident, HashSet<Ident>>,
}

struct SchemaActor;

#[ractor::async_trait]
impl Actor for SchemaActor {
    type Msg = SchemaActorMessage;
    type State = SchemaActorState;
    type Arguments = SqlitePool;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        pool: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("SchemaActor started");
        Ok(SchemaActorState {
            pool,
            known: HashMap::new(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SchemaActorMessage::EnsureColumns(table, columns, rp) => {
                let result = self.handle_ensure_columns(state, &table, columns).await;
                if let Err(e) = &result {
                    warn!(table = %table.as_str(), error = %e, "ensure_columns failed");
                }
                let _ = rp.send(result);
            }
        }
        Ok(())
    }
}

impl SchemaActor {
    async fn handle_ensure_columns(
        &self,
        state: &mut SchemaActorState,
        table: &Ident,
        columns: Vec<Ident>,
    ) -> Result<Vec<Ident>, GalleryError> {
        let known = state.known.entry(table.clone()).or_default();
        let missing: Vec<Ident> = columns
            .into_iter()
            .filter(|c| !known.contains(c))
            .collect();
        if missing.is_empty() {
            debug!(table = %table.as_str(), "all columns already known");
            return Ok(Vec::new());
        }

        let mut conn = state.pool.acquire().await?;
        let added = ensure_columns(&mut conn, table, &missing).await?;
        known.extend(missing);
        Ok(added)
    }
}

/// Spawn the schema actor over `pool` and return a handle.
pub async fn spawn(pool: SqlitePool) -> Result<SchemaHandle, GalleryError> {
    let (actor, _jh) = Actor::spawn(None, SchemaActor, pool)
        .await
        .map_err(|e| GalleryError::RactorError(format!("failed to spawn SchemaActor: {e}")))?;
    Ok(SchemaHandle { actor })
}

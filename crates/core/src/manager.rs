//! Tabular Record Manager: the controller behind every record grid.
//!
//! One generic manager, parameterised by a [`CollectionSchema`], owns the
//! in-memory row list for one collection and mediates load, edit, delete,
//! and export. Sorting, filtering, and pagination only ever read the loaded
//! rows.
//!
//! Store failures never escape as errors. They are logged and the row list
//! is left as it was, so the view can drift from the store until the next
//! [`RecordManager::load`]. Each write reports a [`Reconciliation`] so
//! callers can tell what happened locally.
//!
//! Operations take `&self` and never hold the state lock across a store
//! call, so an edit and a delete on the same row can be in flight at once.
//! Whichever store response lands last decides the final row list.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::collection::{Collection, OWNER_FIELD};
use crate::confirm::{ConfirmAction, ConfirmDecision, DeleteConfirmation};
use crate::csv_export::{export_csv, resolve_columns};
use crate::editor::{EditBuffer, EditorDialog};
use crate::error::CoreError;
use crate::grid::{self, ColumnFilter, GridPage, GridQuery, SortSpec};
use crate::record::{display_value, Record};
use crate::row::RowViewModel;
use crate::schema::{schema_for, CollectionSchema};
use crate::session::Session;
use crate::store::{RecordStore, StoreError};

/// Which records a manager loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The whole collection.
    All,
    /// Only records whose owner field equals this student ID.
    Owner(String),
}

/// What a store-backed operation did to the local row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The store call succeeded and the row list was updated.
    Applied,
    /// The store call failed; the row list is unchanged.
    StoreFailed,
    /// The store call succeeded after the view was unmounted; nothing to update.
    Detached,
    /// Nothing to do: no pending target, or the row was already gone.
    Skipped,
}

#[derive(Default)]
struct ManagerState {
    rows: Vec<RowViewModel>,
    view: GridQuery,
    editor: Option<EditorDialog>,
    pending_delete: Option<DeleteConfirmation>,
    mounted: bool,
}

/// Generic list-view controller for one collection.
pub struct RecordManager<S: RecordStore + ?Sized> {
    store: Arc<S>,
    schema: Arc<CollectionSchema>,
    scope: Scope,
    state: RwLock<ManagerState>,
}

impl<S: RecordStore + ?Sized> std::fmt::Debug for RecordManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordManager")
            .field("schema", &self.schema)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl<S: RecordStore + ?Sized> RecordManager<S> {
    /// Mount a manager over the whole collection.
    pub fn new(store: Arc<S>, schema: CollectionSchema) -> Self {
        Self::with_scope(store, schema, Scope::All)
    }

    pub fn with_scope(store: Arc<S>, schema: CollectionSchema, scope: Scope) -> Self {
        Self {
            store,
            schema: Arc::new(schema),
            scope,
            state: RwLock::new(ManagerState {
                mounted: true,
                ..Default::default()
            }),
        }
    }

    /// Mount the screen a session is entitled to: the admin table, or the
    /// student's own read-only view.
    pub fn for_session(
        store: Arc<S>,
        collection: Collection,
        session: &Session,
    ) -> Result<Self, CoreError> {
        let audience = session.role.audience();
        let schema = schema_for(collection, audience).ok_or_else(|| {
            CoreError::Forbidden(format!(
                "No {} view of {collection}",
                session.role.as_str()
            ))
        })?;
        let scope = match session.owner_scope() {
            Some(owner) => Scope::Owner(owner.to_string()),
            None => Scope::All,
        };
        Ok(Self::with_scope(store, schema, scope))
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn collection(&self) -> Collection {
        self.schema.collection
    }

    fn ensure_writable(&self) -> Result<(), CoreError> {
        if self.schema.read_only() {
            return Err(CoreError::Forbidden(format!(
                "{} is read-only",
                self.schema.name
            )));
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<Vec<Record>, StoreError> {
        match &self.scope {
            Scope::All => self.store.list_all(self.collection()).await,
            Scope::Owner(owner) => {
                self.store
                    .list_where(self.collection(), OWNER_FIELD, &Value::String(owner.clone()))
                    .await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Load and view state
    // -----------------------------------------------------------------------

    /// Fetch every record in scope and replace the row list wholesale.
    ///
    /// On failure the previous rows stay (empty on first load).
    pub async fn load(&self) -> Reconciliation {
        let records = match self.fetch().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    collection = %self.collection(),
                    error = %e,
                    "Failed to load records, keeping previous rows",
                );
                return Reconciliation::StoreFailed;
            }
        };

        let rows: Vec<RowViewModel> = records
            .iter()
            .map(|r| RowViewModel::project(r, &self.schema))
            .collect();

        let mut state = self.state.write().await;
        if !state.mounted {
            return Reconciliation::Detached;
        }
        tracing::debug!(collection = %self.collection(), count = rows.len(), "Rows loaded");
        state.rows = rows;
        Reconciliation::Applied
    }

    /// Loaded rows in load order.
    pub async fn rows(&self) -> Vec<RowViewModel> {
        self.state.read().await.rows.clone()
    }

    pub async fn row(&self, id: &str) -> Option<RowViewModel> {
        self.state
            .read()
            .await
            .rows
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub async fn view(&self) -> GridQuery {
        self.state.read().await.view.clone()
    }

    pub async fn set_view(&self, view: GridQuery) {
        self.state.write().await.view = view;
    }

    /// Change the sort; returns to the first page.
    pub async fn set_sort(&self, sort: Option<SortSpec>) {
        let mut state = self.state.write().await;
        state.view.sort = sort;
        state.view.page = 0;
    }

    /// Replace the filters; returns to the first page.
    pub async fn set_filters(&self, filters: Vec<ColumnFilter>) {
        let mut state = self.state.write().await;
        state.view.filters = filters;
        state.view.page = 0;
    }

    pub async fn goto_page(&self, page: usize) {
        self.state.write().await.view.page = page;
    }

    /// The page the current view selects.
    pub async fn current_page(&self) -> GridPage {
        let state = self.state.read().await;
        grid::paginate(&state.rows, &state.view, self.schema.page_size)
    }

    /// All rows the current sort and filters select, across pages.
    pub async fn visible_rows(&self) -> Vec<RowViewModel> {
        let state = self.state.read().await;
        grid::visible_rows(&state.rows, &state.view)
    }

    // -----------------------------------------------------------------------
    // Edit
    // -----------------------------------------------------------------------

    /// Open the edit dialog for a loaded row. Touches nothing in the store.
    pub async fn begin_edit(&self, row_id: &str) -> Result<EditBuffer, CoreError> {
        self.ensure_writable()?;
        let mut state = self.state.write().await;
        let row = state
            .rows
            .iter()
            .find(|r| r.id == row_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: self.collection().entity(),
                id: row_id.to_string(),
            })?;
        let dialog = EditorDialog::open(row, &self.schema);
        let buffer = dialog.buffer().clone();
        state.editor = Some(dialog);
        Ok(buffer)
    }

    /// Snapshot of the open edit dialog, if any.
    pub async fn editor(&self) -> Option<EditorDialog> {
        self.state.read().await.editor.clone()
    }

    pub async fn edit_field(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut state = self.state.write().await;
        let dialog = state
            .editor
            .as_mut()
            .ok_or_else(|| CoreError::Validation("No edit dialog is open".into()))?;
        dialog.set_field(key, value)
    }

    /// Discard the buffer. No store calls.
    pub async fn cancel_edit(&self) {
        self.state.write().await.editor = None;
    }

    /// Validate the open dialog and commit it.
    ///
    /// A required-field violation keeps the dialog open with its inline
    /// errors and returns [`CoreError::InvalidFields`].
    pub async fn submit_edit(&self) -> Result<Reconciliation, CoreError> {
        let (row_id, buffer) = {
            let mut state = self.state.write().await;
            let mut dialog = state
                .editor
                .take()
                .ok_or_else(|| CoreError::Validation("No edit dialog is open".into()))?;
            if let Err(e) = dialog.validate() {
                state.editor = Some(dialog);
                return Err(e);
            }
            dialog.into_parts()
        };
        Ok(self.commit_edit(&row_id, buffer).await)
    }

    /// Write the buffer's editor fields to the record as a partial update,
    /// then merge them into the loaded row without re-fetching.
    ///
    /// The edit dialog for this row closes whether or not the write succeeds.
    pub async fn commit_edit(&self, row_id: &str, buffer: EditBuffer) -> Reconciliation {
        if let Err(e) = self.ensure_writable() {
            tracing::warn!(record_id = %row_id, error = %e, "Edit rejected");
            return Reconciliation::Skipped;
        }

        let patch = buffer.to_patch(&self.schema);
        let result = self
            .store
            .update_partial(self.collection(), row_id, patch.clone())
            .await;

        let mut state = self.state.write().await;
        if state.editor.as_ref().is_some_and(|d| d.row_id() == row_id) {
            state.editor = None;
        }

        if let Err(e) = result {
            tracing::error!(
                collection = %self.collection(),
                record_id = %row_id,
                error = %e,
                "Failed to save edit",
            );
            return Reconciliation::StoreFailed;
        }
        if !state.mounted {
            return Reconciliation::Detached;
        }

        let Some(row) = state.rows.iter_mut().find(|r| r.id == row_id) else {
            tracing::debug!(record_id = %row_id, "Edited row no longer loaded");
            return Reconciliation::Skipped;
        };

        let mut cells = row.cells.clone();
        for field in &self.schema.editor {
            let value = self
                .schema
                .source_for(&field.key)
                .and_then(|source| patch.get(source));
            if let Some(value) = value {
                cells.insert(field.key.clone(), display_value(value).unwrap_or_default());
            }
        }
        *row = RowViewModel::from_cells(row.id.clone(), cells, &self.schema);
        tracing::info!(collection = %self.collection(), record_id = %row_id, "Record updated");
        Reconciliation::Applied
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Record the intent to delete a loaded row and open the confirmation.
    pub async fn begin_delete(&self, row_id: &str) -> Result<(), CoreError> {
        self.ensure_writable()?;
        let mut state = self.state.write().await;
        if !state.rows.iter().any(|r| r.id == row_id) {
            return Err(CoreError::NotFound {
                entity: self.collection().entity(),
                id: row_id.to_string(),
            });
        }
        state.pending_delete = Some(DeleteConfirmation::new(row_id));
        Ok(())
    }

    /// Target of the open confirmation, if any.
    pub async fn pending_delete(&self) -> Option<String> {
        self.state
            .read()
            .await
            .pending_delete
            .as_ref()
            .map(|d| d.target().to_string())
    }

    /// Feed a user action to the confirmation dialog.
    ///
    /// Returns the outcome only when the action released the gate and the
    /// store was called.
    pub async fn respond_delete(&self, action: ConfirmAction) -> Option<Reconciliation> {
        let decision = {
            let state = self.state.read().await;
            state.pending_delete.as_ref().map(|d| d.resolve(action))
        };
        match decision? {
            ConfirmDecision::Confirmed(_) => Some(self.confirm_delete().await),
            ConfirmDecision::Cancelled => {
                self.cancel_delete().await;
                None
            }
            ConfirmDecision::StillOpen => None,
        }
    }

    /// Close the confirmation without touching the store.
    pub async fn cancel_delete(&self) {
        self.state.write().await.pending_delete = None;
    }

    /// Delete the pending target and drop its row on success.
    pub async fn confirm_delete(&self) -> Reconciliation {
        let pending = self.state.write().await.pending_delete.take();
        let Some(target) = pending else {
            return Reconciliation::Skipped;
        };
        let row_id = target.target();

        let result = self.store.delete(self.collection(), row_id).await;

        let mut state = self.state.write().await;
        if let Err(e) = result {
            tracing::error!(
                collection = %self.collection(),
                record_id = %row_id,
                error = %e,
                "Failed to delete record",
            );
            return Reconciliation::StoreFailed;
        }
        if !state.mounted {
            return Reconciliation::Detached;
        }

        let before = state.rows.len();
        state.rows.retain(|r| r.id != row_id);
        if state.rows.len() == before {
            return Reconciliation::Skipped;
        }
        tracing::info!(collection = %self.collection(), record_id = %row_id, "Record deleted");
        Reconciliation::Applied
    }

    // -----------------------------------------------------------------------
    // Export and lifecycle
    // -----------------------------------------------------------------------

    /// CSV of every row the current view selects, in view order, limited to
    /// the requested columns that exist and are exportable.
    pub async fn export_visible<K: AsRef<str>>(&self, columns: &[K]) -> Result<String, CoreError> {
        let rows = self.visible_rows().await;
        let columns = resolve_columns(&self.schema, columns);
        export_csv(&rows, &columns)
    }

    /// Detach the view. Store calls still in flight complete, but their
    /// results no longer touch the row list.
    pub async fn unmount(&self) {
        let mut state = self.state.write().await;
        state.mounted = false;
        state.editor = None;
        state.pending_delete = None;
    }

    pub async fn is_mounted(&self) -> bool {
        self.state.read().await.mounted
    }
}

use crate::{auth::auth, models::{DiagnosticsResponse, ErrorResponse}, AppState};
use axum::{extract::{Extension, State}, http::StatusCode, Json};
use std::sync::{Arc, Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Runtime diagnostics: room and presence counts, pending saves, and host
/// resource usage.
pub async fn diagnostics(
    State(app_state): State<Arc<AppState>>,
    Extension(roles): Extension<Vec<String>>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {

    // Diagnostics are admin-only
    let _ = auth::ensure_admin(&roles)?;

    let n_rooms = app_state.rooms.room_count().await as u32;
    let n_presence = app_state.rooms.presence_count().await as u32;
    let n_pending_saves = app_state.saver.pending_count().await as u32;
    let n_cached_snapshots = app_state.snapshots.entry_count() as u32;

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Rooms: {}, Presence: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_rooms,
        n_presence
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_rooms,
            n_presence,
            n_pending_saves,
            n_cached_snapshots,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}

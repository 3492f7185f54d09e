// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk credential artifact layout for WhatsApp sessions.
//!
//! The automation layer persists either a session directory named
//! `_IGNORE_<id>` or a single `<id>.data.json` file under
//! `<data_dir>/sessions/`. Either one counts as a live credential.

use std::path::{Path, PathBuf};

/// Directory holding all WhatsApp session artifacts.
pub fn sessions_dir(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join("sessions")
}

/// Whether a credential artifact exists for `session_id`.
pub fn artifacts_exist(data_dir: &str, session_id: &str) -> bool {
    let dir = sessions_dir(data_dir);
    dir.join(format!("_IGNORE_{session_id}")).is_dir()
        || dir.join(format!("{session_id}.data.json")).is_file()
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::BTreeSet;

use lockbox::core::{NoteRecord, Priority, Record, RecordId, TaskRecord, TaskStatus};
use lockbox::perms::Permission;
use lockbox::remote::MemoryServer;
use lockbox::store::{LegacyRecord, MemoryLegacySource, MemoryStore};
use lockbox::{Lockbox, LockboxConfig, Session};

/// A signed-in user with a Lockbox over an in-memory store.
pub struct TestFixture {
    pub session: Session,
    pub server: MemoryServer,
    pub lockbox: Lockbox<MemoryStore, MemoryServer>,
}

impl TestFixture {
    /// Create a fixture for `username` with its own server.
    pub fn new(username: &str) -> Self {
        Self::on_server(username, MemoryServer::new())
    }

    /// Create a fixture that shares `server` with other fixtures.
    pub fn on_server(username: &str, server: MemoryServer) -> Self {
        Self::with_config(username, server, LockboxConfig::default())
    }

    pub fn with_config(username: &str, server: MemoryServer, config: LockboxConfig) -> Self {
        Self {
            session: Session::generate(username),
            lockbox: Lockbox::new(MemoryStore::new(), server.clone(), config),
            server,
        }
    }

    /// Publish this user's public key as `username` and `username@example.com`.
    pub async fn register(&self) {
        let username = self.session.username();
        self.server
            .register(
                username,
                Some(&format!("{}@example.com", username)),
                self.session.public_key(),
            )
            .await;
    }

    /// Save `count` sample notes as `note-0 .. note-{count-1}`.
    pub async fn save_notes(&self, count: usize) -> lockbox::Result<Vec<RecordId>> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let id = RecordId::new(format!("note-{}", i));
            self.lockbox
                .save(&self.session, id.clone(), sample_note(i))
                .await?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Publish the current local integrity root as the server's.
    pub async fn publish_integrity_root(&self) -> lockbox::Result<()> {
        let root = self.lockbox.integrity_root().await?;
        self.server
            .set_integrity_root(&root.root, root.leaf_count)
            .await;
        Ok(())
    }
}

/// Create fixtures for several users on one server, all registered.
pub async fn multi_party_fixtures(usernames: &[&str]) -> Vec<TestFixture> {
    let server = MemoryServer::new();
    let mut fixtures = Vec::with_capacity(usernames.len());
    for username in usernames {
        let fixture = TestFixture::on_server(username, server.clone());
        fixture.register().await;
        fixtures.push(fixture);
    }
    fixtures
}

/// A deterministic note.
pub fn sample_note(i: usize) -> Record {
    Record::Note(NoteRecord {
        title: format!("Note {}", i),
        content: format!("Content of note {}", i),
        folder_id: (i % 2 == 0).then(|| "folder-1".to_string()),
    })
}

/// A deterministic task.
pub fn sample_task(i: usize) -> Record {
    Record::Task(TaskRecord {
        title: format!("Task {}", i),
        description: "Write it up".into(),
        notes: String::new(),
        priority: Priority::Medium,
        status: TaskStatus::Todo,
        due_date: Some(format!("2026-11-{:02}", i % 28 + 1)),
    })
}

/// A plaintext backlog of `count` tasks named `legacy-0 ..`.
pub fn legacy_backlog(count: usize) -> MemoryLegacySource {
    MemoryLegacySource::new(
        (0..count).map(|i| LegacyRecord::new(format!("legacy-{}", i), sample_task(i))),
    )
}

pub fn read_only() -> BTreeSet<Permission> {
    [Permission::Read].into_iter().collect()
}

//! Test utilities: in-memory stand-ins for the record stores and the mailer

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use tradesignal::db::{TaskRepository, UserRepository};
use tradesignal::error::{MailError, StoreError};
use tradesignal::jobs::JobContext;
use tradesignal::mail::{Mailer, Notification, Recipient};
use tradesignal::metrics::Metrics;
use tradesignal::models::{NewTask, Task, User, STATUS_RUNNING};

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicI32,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let task = task.into_task(id, Utc::now().naive_utc());
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn get_by_user_and_id(&self, user_id: &str, id: i32) -> Result<Option<Task>, StoreError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_running(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.status == STATUS_RUNNING)
            .cloned()
            .collect())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let count = tasks.len() as u64;
        tasks.clear();
        Ok(count)
    }

    async fn delete_by_user_and_id(&self, user_id: &str, id: i32) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok((before - tasks.len()) as u64)
    }

    async fn drop_table(&self) -> Result<(), StoreError> {
        self.tasks.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }
}

/// Mailer that records every message and can be told to fail
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(Recipient, Notification)>>,
    failure: Mutex<Option<(u16, bool)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Recipient, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    /// Reject every following send with the given HTTP status
    pub fn fail_with_status(&self, status: u16) {
        *self.failure.lock().unwrap() = Some((status, false));
    }

    /// Fail every following send with a transient transport error
    pub fn fail_transport(&self) {
        *self.failure.lock().unwrap() = Some((0, true));
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &Recipient, notification: &Notification) -> Result<(), MailError> {
        if let Some((status, transport)) = *self.failure.lock().unwrap() {
            return Err(if transport {
                MailError::Transport {
                    message: "connection reset".to_string(),
                    transient: true,
                }
            } else {
                MailError::Rejected {
                    status,
                    body: "{}".to_string(),
                }
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.clone(), notification.clone()));
        Ok(())
    }
}

pub fn user(id: &str, name: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: "$2b$10$hash".to_string(),
        email_verified: None,
        image: None,
    }
}

/// Handles to the fakes behind a [`JobContext`]
pub struct Harness {
    pub tasks: Arc<InMemoryTaskStore>,
    pub users: Arc<InMemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
    pub metrics: Arc<Metrics>,
    pub context: Arc<JobContext>,
}

impl Harness {
    pub fn new() -> Self {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let context = Arc::new(JobContext::new(
            tasks.clone(),
            users.clone(),
            mailer.clone(),
            Some(metrics.clone()),
        ));
        Self {
            tasks,
            users,
            mailer,
            metrics,
            context,
        }
    }
}

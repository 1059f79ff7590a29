use std::sync::OnceLock;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Process-lifetime chat identifier shared by every session-relay request.
///
/// Set at most once; concurrent first calls all observe the same value.
/// There is no reset, a new identifier only comes with a new process.
#[derive(Debug, Default)]
pub struct ChatSession {
    id: OnceLock<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> &str {
        self.id.get_or_init(|| {
            let id = generate_chat_id();
            info!(chat_id = %id, "created chat session");
            id
        })
    }

    #[cfg(test)]
    pub fn get(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }
}

pub fn generate_chat_id() -> String {
    format!("chat-{}-{}", Utc::now().timestamp_millis(), random_suffix())
}

fn random_suffix() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        out.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use wt_store::Commit;
use wt_types::ObjectId;

/// Split `Name <email>` at the last space. Anything else is all name.
pub fn split_name_email(ident: &str) -> (String, String) {
    match ident.rsplit_once(' ') {
        Some((name, email)) if email.starts_with('<') && email.ends_with('>') && email.len() >= 2 => {
            (name.to_string(), email[1..email.len() - 1].to_string())
        }
        _ => (ident.to_string(), String::new()),
    }
}

/// Display-ready view of a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub sha: ObjectId,
    pub author: String,
    pub author_name: String,
    pub author_email: String,
    pub committer: String,
    pub committer_name: String,
    pub committer_email: String,
    pub time: DateTime<Utc>,
    pub message: String,
    /// First line of the message.
    pub summary: String,
    /// The remaining non-empty lines.
    pub description: String,
    pub parents: Vec<ObjectId>,
}

impl CommitInfo {
    pub fn new(sha: ObjectId, commit: &Commit) -> Self {
        let (author_name, author_email) = split_name_email(&commit.author);
        let (committer_name, committer_email) = split_name_email(&commit.committer);
        let mut lines = commit.message.lines();
        let summary = lines.next().unwrap_or_default().to_string();
        let description = lines
            .filter(|l| !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            sha,
            author: commit.author.clone(),
            author_name,
            author_email,
            committer: commit.committer.clone(),
            committer_name,
            committer_email,
            time: commit.time,
            message: commit.message.clone(),
            summary,
            description,
            parents: commit.parents.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_email_split() {
        assert_eq!(
            split_name_email("Ada Lovelace <ada@example.com>"),
            ("Ada Lovelace".to_string(), "ada@example.com".to_string())
        );
        assert_eq!(split_name_email("nobody"), ("nobody".to_string(), String::new()));
        assert_eq!(split_name_email("two words"), ("two words".to_string(), String::new()));
    }

    #[test]
    fn summary_and_description() {
        let commit = Commit::new(
            ObjectId::null(),
            vec![],
            "Ada <ada@example.com>",
            "Fix parser\n\nHandle empty input.\n\nAdd tests.\n",
        );
        let info = CommitInfo::new(ObjectId::from_bytes(b"c"), &commit);
        assert_eq!(info.summary, "Fix parser");
        assert_eq!(info.description, "Handle empty input.\nAdd tests.");
        assert_eq!(info.author_name, "Ada");
        assert_eq!(info.committer_email, "ada@example.com");
        assert_eq!(info.time, commit.time);
    }

    #[test]
    fn empty_message() {
        let commit = Commit::new(ObjectId::null(), vec![], "x", "");
        let info = CommitInfo::new(ObjectId::null(), &commit);
        assert_eq!(info.summary, "");
        assert_eq!(info.description, "");
    }
}

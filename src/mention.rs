//! Eligibility rules for mentions: whether a tag is an explicit summon of the
//! agent or just the reply-prefix Twitter carries along in a thread.
//!
//! Twitter prefixes every reply with the handles of the people in the thread,
//! ordered by recency, so a thread participant replying "ok" can look exactly
//! like a fresh `@agent` tag. A tag counts as explicit when it appears in the
//! message body, when the agent is tagged twice, or when it is the first time
//! the agent shows up in the thread at all.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::gate::types::TweetId;

static REPLY_TAG_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(@\w+\s+)*").expect("reply tag pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: TweetId,
    /// Username without the leading `@`.
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub has_media: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetMention {
    /// The tweet that tagged the agent.
    pub tagged: Tweet,
    /// Root of the conversation when the tag was a reply.
    #[serde(default)]
    pub original: Option<Tweet>,
    /// Replies between the root and the tagged tweet.
    #[serde(default)]
    pub replies: Vec<Tweet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    TaggedInOriginal,
    TaggedInDirectReply,
    TaggedInThread,
}

impl TweetMention {
    pub fn kind(&self) -> MentionKind {
        match (&self.original, self.replies.is_empty()) {
            (None, _) => MentionKind::TaggedInOriginal,
            (Some(_), true) => MentionKind::TaggedInDirectReply,
            (Some(_), false) => MentionKind::TaggedInThread,
        }
    }
}

/// Drops the leading chain of `@handle ` reply tags. A trailing tag with no
/// message after it is kept, since tweets cannot be empty.
pub fn strip_reply_tags(text: &str) -> &str {
    let stripped = match REPLY_TAG_PREFIX.find(text) {
        Some(prefix) => &text[prefix.end()..],
        None => text,
    };
    stripped.trim()
}

pub fn should_reply_to_mention(agent_handle: &str, mention: &TweetMention) -> bool {
    let handle = if agent_handle.starts_with('@') {
        agent_handle.to_string()
    } else {
        format!("@{agent_handle}")
    };

    if mention.tagged.has_media
        || mention
            .original
            .as_ref()
            .is_some_and(|original| original.has_media)
    {
        return false;
    }

    let kind = mention.kind();
    if kind == MentionKind::TaggedInOriginal {
        return true;
    }

    let tagged_text = mention.tagged.text.as_str();
    if !tagged_text.contains(&handle) {
        return false;
    }

    if strip_reply_tags(tagged_text).contains(&handle) {
        return true;
    }

    let tag_count = tagged_text.matches(&handle).count();
    if tag_count >= 2 {
        return true;
    }

    let tagged_in_original = mention
        .original
        .as_ref()
        .is_some_and(|original| original.text.contains(&handle));
    if kind == MentionKind::TaggedInDirectReply {
        return !tagged_in_original;
    }

    let username = &handle[1..];
    let replied_earlier = mention
        .replies
        .iter()
        .any(|reply| reply.author == username);
    let tagged_earlier =
        tagged_in_original || mention.replies.iter().any(|reply| reply.text.contains(&handle));

    !replied_earlier && !tagged_earlier
}

use echos::{
    gate::ActionCategory,
    mention::{MentionKind, Tweet, TweetMention, should_reply_to_mention},
    pipeline::PipelineOutcome,
    telemetry::GateTelemetryEvent,
};

use super::{HarnessBuilder, event, report};

const AGENT: &str = "echos_agent";

fn tweet(id: u64, author: &str, text: &str) -> Tweet {
    Tweet {
        id,
        author: author.to_string(),
        text: text.to_string(),
        has_media: false,
    }
}

fn direct_reply(original: &str, tagged: &str) -> TweetMention {
    TweetMention {
        tagged: tweet(2, "userB", tagged),
        original: Some(tweet(1, "userA", original)),
        replies: Vec::new(),
    }
}

#[test]
fn given_agent_tagged_in_original_when_checked_then_reply() {
    let mention = TweetMention {
        tagged: tweet(1, "userA", "@echos_agent what is the play today"),
        original: None,
        replies: Vec::new(),
    };
    assert_eq!(mention.kind(), MentionKind::TaggedInOriginal);
    assert!(should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_media_on_tagged_tweet_when_checked_then_no_reply() {
    let mut mention = TweetMention {
        tagged: tweet(1, "userA", "@echos_agent look at this"),
        original: None,
        replies: Vec::new(),
    };
    mention.tagged.has_media = true;
    assert!(!should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_media_on_original_when_checked_then_no_reply() {
    let mut mention = direct_reply("chart attached", "@userA @echos_agent thoughts?");
    if let Some(original) = mention.original.as_mut() {
        original.has_media = true;
    }
    assert!(!should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_handle_only_in_reply_prefix_of_direct_reply_when_original_untagged_then_reply() {
    let mention = direct_reply("gm everyone", "@userA @echos_agent");
    assert_eq!(mention.kind(), MentionKind::TaggedInDirectReply);
    assert!(should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_handle_only_in_reply_prefix_when_original_tagged_agent_then_no_reply() {
    let mention = direct_reply("@echos_agent gm", "@userA @echos_agent nice");
    assert!(!should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_handle_in_message_body_when_checked_then_reply() {
    let mention = direct_reply("@echos_agent gm", "@userA what does @echos_agent think");
    assert!(should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_handle_absent_from_tagged_text_when_checked_then_no_reply() {
    let mention = direct_reply("gm", "@userA agreed");
    assert!(!should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_thread_where_agent_already_replied_when_checked_then_no_reply() {
    let mention = TweetMention {
        tagged: tweet(4, "userC", "@userB @echos_agent lol"),
        original: Some(tweet(1, "userA", "gm")),
        replies: vec![tweet(2, "echos_agent", "@userA gm"), tweet(3, "userB", "@echos_agent gm")],
    };
    assert_eq!(mention.kind(), MentionKind::TaggedInThread);
    assert!(!should_reply_to_mention(AGENT, &mention));
}

#[test]
fn given_thread_where_agent_never_appeared_when_checked_then_reply() {
    let mention = TweetMention {
        tagged: tweet(4, "userC", "@userB @echos_agent gm"),
        original: Some(tweet(1, "userA", "gm")),
        replies: vec![tweet(3, "userB", "@userA gm")],
    };
    assert!(should_reply_to_mention("@echos_agent", &mention));
}

#[tokio::test]
async fn given_reply_prefix_noise_when_handle_then_not_summoned_without_rating() {
    let harness = HarnessBuilder::new()
        .settings(|settings| settings.agent_handle = Some(AGENT.to_string()))
        .build();
    harness.rater.set(20, Ok(report(10, None)));
    let mut noisy = event(ActionCategory::Mention, 20);
    noisy.mention = Some(direct_reply("@echos_agent gm", "@userA @echos_agent nice"));

    let outcome = harness
        .pipeline
        .handle(noisy)
        .await
        .expect("pipeline should succeed");

    assert_eq!(outcome, PipelineOutcome::NotSummoned { tweet_id: 20 });
    assert_eq!(harness.rater.calls(), 0);
    assert!(harness.log.is_empty());
    assert!(matches!(
        harness.telemetry.events().as_slice(),
        [GateTelemetryEvent::NotSummoned { tweet_id: 20 }]
    ));
}

#[tokio::test]
async fn given_no_agent_handle_when_handle_then_mention_context_is_ignored() {
    let harness = HarnessBuilder::new().build();
    harness.rater.set(21, Ok(report(10, None)));
    let mut noisy = event(ActionCategory::Mention, 21);
    noisy.mention = Some(direct_reply("@echos_agent gm", "@userA @echos_agent nice"));

    let outcome = harness
        .pipeline
        .handle(noisy)
        .await
        .expect("pipeline should succeed");
    assert!(outcome.is_acted());
}

mod mocks;

use clip_datastore::{ChatAccount, Platform};
use clip_pulse::{
    platform::VideoMeta, PollProcessor, PollProcessorBuilder, SubscribeError, SubscriptionService,
    UnsubscribeError,
};
use mocks::{
    datastore::MockDataStore, notifier::MockNotifier, platforms::MockPlatforms,
    summarizer::MockSummarizer,
};

fn chat(id: i64) -> ChatAccount {
    ChatAccount {
        chat_id: id,
        username: Some(format!("user{id}")),
        first_name: Some("Anh".to_string()),
    }
}

fn video_meta(video_id: &str, title: Option<&str>) -> VideoMeta {
    VideoMeta {
        video_id: video_id.to_string(),
        title: title.map(str::to_string),
        url: format!("https://www.youtube.com/watch?v={video_id}"),
        published_at: None,
    }
}

fn build_processor(
    store: MockDataStore,
    platforms: MockPlatforms,
    summarizer: MockSummarizer,
    notifier: MockNotifier,
) -> PollProcessor<MockDataStore, MockPlatforms, MockSummarizer, MockNotifier> {
    PollProcessorBuilder::new()
        .store(store)
        .platforms(platforms)
        .summarizer(summarizer)
        .notifier(notifier)
        .build()
}

// ─── Subscription service ────────────────────────────────────────────────────

#[tokio::test]
async fn test_subscribe_twice_is_rejected_with_one_row() {
    let store = MockDataStore::default();
    let service = SubscriptionService::new(store.clone(), MockPlatforms::resolving("UCxxxx", "Kênh A"));
    let user = chat(42);
    let url = "https://www.youtube.com/channel/UCxxxx";

    let first = service.subscribe(&user, url).await;
    assert!(first.is_ok(), "First subscribe should succeed: {:?}", first.err());

    let second = service.subscribe(&user, url).await;
    assert!(
        matches!(second, Err(SubscribeError::AlreadySubscribed { .. })),
        "Second subscribe should be rejected, got: {second:?}"
    );

    assert_eq!(store.subscription_count(), 1, "Exactly one Subscription row");
    assert_eq!(store.channel_count(), 1, "Exactly one Channel row");
}

#[tokio::test]
async fn test_subscribe_rejects_unsupported_url() {
    let store = MockDataStore::default();
    let service = SubscriptionService::new(store.clone(), MockPlatforms::resolving("UCxxxx", "Kênh A"));

    let result = service.subscribe(&chat(42), "https://vimeo.com/123456").await;
    assert!(matches!(result, Err(SubscribeError::UnsupportedUrl)));
    assert_eq!(store.channel_count(), 0);
    assert_eq!(store.subscription_count(), 0);
}

#[tokio::test]
async fn test_two_subscribers_observe_the_same_channel() {
    let store = MockDataStore::default();
    let service = SubscriptionService::new(store.clone(), MockPlatforms::resolving("UCxxxx", "Kênh A"));
    let url = "https://www.youtube.com/channel/UCxxxx";

    let first = service.subscribe(&chat(1), url).await.expect("first user subscribes");
    let second = service.subscribe(&chat(2), url).await.expect("second user subscribes");

    assert_eq!(store.channel_count(), 1, "Exactly one Channel row afterwards");
    assert_eq!(store.subscription_count(), 2);
    assert_eq!(first.id, second.id, "Both calls observe the same channel identity");
}

#[tokio::test]
async fn test_unsubscribe_without_subscription_fails_unchanged() {
    let store = MockDataStore::default();
    let service = SubscriptionService::new(store.clone(), MockPlatforms::resolving("UCxxxx", "Kênh A"));
    let url = "https://www.youtube.com/channel/UCxxxx";

    // Channel unknown to the store entirely
    let result = service.unsubscribe(&chat(1), url).await;
    assert!(matches!(result, Err(UnsubscribeError::UnknownChannel)));

    // Channel exists via someone else's subscription, but not this user's
    service.subscribe(&chat(2), url).await.expect("other user subscribes");
    let result = service.unsubscribe(&chat(1), url).await;
    assert!(matches!(result, Err(UnsubscribeError::NotSubscribed)));

    assert_eq!(store.subscription_count(), 1, "Store left unchanged");
    assert_eq!(store.channel_count(), 1);
}

#[tokio::test]
async fn test_unsubscribe_removes_the_subscription() {
    let store = MockDataStore::default();
    let service = SubscriptionService::new(store.clone(), MockPlatforms::resolving("UCxxxx", "Kênh A"));
    let url = "https://www.youtube.com/channel/UCxxxx";

    service.subscribe(&chat(1), url).await.expect("subscribe");
    service.unsubscribe(&chat(1), url).await.expect("unsubscribe");

    assert_eq!(store.subscription_count(), 0);
    assert_eq!(store.channel_count(), 1, "Channel row outlives the subscription");
}

#[tokio::test]
async fn test_list_subscriptions_returns_subscribed_channels() {
    let store = MockDataStore::default();
    let service = SubscriptionService::new(store.clone(), MockPlatforms::resolving("UCxxxx", "Kênh A"));

    assert!(service.list_subscriptions(&chat(1)).await.unwrap().is_empty());

    service
        .subscribe(&chat(1), "https://www.youtube.com/channel/UCxxxx")
        .await
        .expect("subscribe");

    let channels = service.list_subscriptions(&chat(1)).await.unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].channel_id, "UCxxxx");
}

// ─── Poll cycle ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_poll_inserts_each_video_at_most_once() {
    let store = MockDataStore::default();
    let channel = store.seed_stale_channel(Platform::Youtube, "UCxxxx");
    let platforms = MockPlatforms::resolving("UCxxxx", "Kênh A")
        .with_videos(vec![video_meta("vid-1", Some("Tập 1")), video_meta("vid-2", None)]);

    let processor = build_processor(
        store.clone(),
        platforms,
        MockSummarizer::new("tóm tắt"),
        MockNotifier::default(),
    );

    processor.run().await.expect("first cycle");
    assert_eq!(store.video_count(), 2);

    // Same fetched list on a later cycle finds the existing rows
    store.set_stale(channel.id);
    processor.run().await.expect("second cycle");
    assert_eq!(store.video_count(), 2, "Videos are inserted at most once");
}

#[tokio::test]
async fn test_happy_path_subscribe_poll_summarize_notify() {
    let store = MockDataStore::default();
    let platforms = MockPlatforms::resolving("UCxxxx", "Kênh A")
        .with_videos(vec![video_meta("vid-1", Some("Tập 1")), video_meta("vid-2", Some("Tập 2"))]);
    let service = SubscriptionService::new(store.clone(), platforms.clone());

    let channel = service
        .subscribe(&chat(42), "https://www.youtube.com/channel/UCxxxx")
        .await
        .expect("subscribe");
    store.set_stale(channel.id);

    let summarizer = MockSummarizer::new("## Tóm tắt\nNội dung chính.");
    let notifier = MockNotifier::default();
    let summarizer_calls = summarizer.calls.clone();
    let sent = notifier.sent.clone();

    let processor = build_processor(store.clone(), platforms, summarizer, notifier);
    processor.run().await.expect("poll cycle");

    let videos = store.videos();
    assert_eq!(videos.len(), 2, "Two Video rows created");
    for video in &videos {
        assert!(video.processed, "Video {} should be processed", video.video_id);
        assert_eq!(video.summary.as_deref(), Some("## Tóm tắt\nNội dung chính."));
    }

    let summarizer_calls = summarizer_calls.lock().unwrap();
    assert_eq!(summarizer_calls.len(), 2);
    assert!(summarizer_calls.iter().all(|(_, lang)| lang == "vi"));

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2, "One notification per video to the one subscriber");
    for (chat_id, text) in sent.iter() {
        assert_eq!(*chat_id, 42);
        assert!(text.contains("Kênh A"));
        assert!(text.contains("📋 Tóm tắt:"));
    }
}

#[tokio::test]
async fn test_failed_fetch_still_advances_last_checked() {
    let store = MockDataStore::default();
    let channel = store.seed_stale_channel(Platform::Youtube, "UCxxxx");
    let before = store.last_checked(channel.id);

    let platforms = MockPlatforms::resolving("UCxxxx", "Kênh A").failing_list("network error");
    let notifier = MockNotifier::default();
    let sent = notifier.sent.clone();

    let processor = build_processor(store.clone(), platforms, MockSummarizer::new("tóm tắt"), notifier);
    let result = processor.run().await;
    assert!(result.is_ok(), "Fetch failure must not escape the cycle: {:?}", result.err());

    assert!(store.last_checked(channel.id) > before, "last_checked advances");
    assert_eq!(store.video_count(), 0, "No Video rows created");
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_fetch_still_advances_last_checked() {
    let store = MockDataStore::default();
    let channel = store.seed_stale_channel(Platform::Tiktok, "some.user");
    let before = store.last_checked(channel.id);

    let processor = build_processor(
        store.clone(),
        MockPlatforms::resolving("some.user", "Kênh B"),
        MockSummarizer::new("tóm tắt"),
        MockNotifier::default(),
    );
    processor.run().await.expect("cycle with zero videos");

    assert!(store.last_checked(channel.id) > before);
    assert_eq!(store.video_count(), 0);
}

#[tokio::test]
async fn test_insert_failure_still_advances_last_checked() {
    let store = MockDataStore::failing_inserts("connection reset");
    let channel = store.seed_stale_channel(Platform::Youtube, "UCxxxx");
    let before = store.last_checked(channel.id);

    let platforms =
        MockPlatforms::resolving("UCxxxx", "Kênh A").with_videos(vec![video_meta("vid-1", None)]);
    let processor = build_processor(
        store.clone(),
        platforms,
        MockSummarizer::new("tóm tắt"),
        MockNotifier::default(),
    );

    let result = processor.run().await;
    assert!(result.is_ok(), "Mid-cycle store failure is contained");
    assert!(store.last_checked(channel.id) > before);
}

#[tokio::test]
async fn test_summarization_failure_sends_partial_notification() {
    let store = MockDataStore::default();
    let platforms =
        MockPlatforms::resolving("UCxxxx", "Kênh A").with_videos(vec![video_meta("vid-1", Some("Tập 1"))]);
    let service = SubscriptionService::new(store.clone(), platforms.clone());

    let channel = service
        .subscribe(&chat(42), "https://www.youtube.com/channel/UCxxxx")
        .await
        .expect("subscribe");
    store.set_stale(channel.id);

    let notifier = MockNotifier::default();
    let sent = notifier.sent.clone();

    let processor = build_processor(
        store.clone(),
        platforms,
        MockSummarizer::failing("rate limited"),
        notifier,
    );
    processor.run().await.expect("poll cycle");

    let videos = store.videos();
    assert_eq!(videos.len(), 1);
    assert!(!videos[0].processed, "Video stays unprocessed for a later retry");
    assert!(videos[0].summary.is_none());

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "Notification still goes out");
    assert!(sent[0].1.contains("Tập 1"));
    assert!(!sent[0].1.contains("Tóm tắt"), "No summary block in the message");
}

#[tokio::test]
async fn test_extraction_failure_also_leaves_video_unprocessed() {
    let store = MockDataStore::default();
    let platforms = MockPlatforms::resolving("UCxxxx", "Kênh A")
        .with_videos(vec![video_meta("vid-1", None)])
        .without_content();
    let service = SubscriptionService::new(store.clone(), platforms.clone());

    let channel = service
        .subscribe(&chat(42), "https://www.youtube.com/channel/UCxxxx")
        .await
        .expect("subscribe");
    store.set_stale(channel.id);

    let extract_calls = platforms.extract_calls.clone();
    let summarizer = MockSummarizer::new("tóm tắt");
    let summarizer_calls = summarizer.calls.clone();

    let processor = build_processor(store.clone(), platforms, summarizer, MockNotifier::default());
    processor.run().await.expect("poll cycle");

    let videos = store.videos();
    assert_eq!(videos.len(), 1);
    assert!(!videos[0].processed);
    assert_eq!(extract_calls.lock().unwrap().len(), 1, "Extraction was attempted");
    assert!(
        summarizer_calls.lock().unwrap().is_empty(),
        "Nothing to summarize when extraction fails"
    );
}

#[tokio::test]
async fn test_delivery_failure_does_not_block_other_subscribers() {
    let store = MockDataStore::default();
    let platforms =
        MockPlatforms::resolving("UCxxxx", "Kênh A").with_videos(vec![video_meta("vid-1", None)]);
    let service = SubscriptionService::new(store.clone(), platforms.clone());

    let url = "https://www.youtube.com/channel/UCxxxx";
    let channel = service.subscribe(&chat(1), url).await.expect("first subscriber");
    service.subscribe(&chat(2), url).await.expect("second subscriber");
    store.set_stale(channel.id);

    let notifier = MockNotifier::failing_for(1);
    let sent = notifier.sent.clone();

    let processor = build_processor(store, platforms, MockSummarizer::new("tóm tắt"), notifier);
    processor.run().await.expect("poll cycle");

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "Second subscriber still notified");
    assert_eq!(sent[0].0, 2);
}

#[tokio::test]
async fn test_batch_limit_services_oldest_channel_first() {
    let store = MockDataStore::default();
    // Seeded first, so its last_checked is the oldest
    store.seed_stale_channel(Platform::Youtube, "UCold");
    store.seed_stale_channel(Platform::Youtube, "UCnew");

    let platforms = MockPlatforms::resolving("UCold", "Kênh");
    let list_calls = platforms.list_calls.clone();

    let processor = PollProcessorBuilder::new()
        .store(store)
        .platforms(platforms)
        .summarizer(MockSummarizer::new("tóm tắt"))
        .notifier(MockNotifier::default())
        .max_channels(1)
        .build();
    processor.run().await.expect("poll cycle");

    let list_calls = list_calls.lock().unwrap();
    assert_eq!(list_calls.len(), 1, "Batch size bounds per-cycle work");
    assert_eq!(list_calls[0].1, "UCold", "Oldest-checked channel is serviced first");
}

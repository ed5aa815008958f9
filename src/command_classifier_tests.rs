use crate::command_classifier::CommandClassifier;
use crate::traits::{SpamClassifier, Verdict};
use std::time::Duration;

const RAW: &[u8] = b"From: a@example.com\r\nSubject: buy now\r\n\r\ncheap pills\r\n";

fn shell(script: &str) -> CommandClassifier {
    CommandClassifier::new(
        "sh".to_string(),
        vec!["-c".to_string(), script.to_string()],
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_exit_one_is_spam() {
    let classifier = shell("cat > /dev/null; exit 1");
    let verdict = classifier.classify(RAW).await.unwrap();
    assert_eq!(verdict, Verdict::Spam);
}

#[tokio::test]
async fn test_exit_zero_is_not_spam() {
    let classifier = shell("cat > /dev/null; exit 0");
    let verdict = classifier.classify(RAW).await.unwrap();
    assert_eq!(verdict, Verdict::NotSpam);
}

#[tokio::test]
async fn test_other_exit_codes_are_not_spam() {
    for code in [2, 3, 127] {
        let classifier = shell(&format!("cat > /dev/null; exit {}", code));
        let verdict = classifier.classify(RAW).await.unwrap();
        assert_eq!(verdict, Verdict::NotSpam, "exit code {}", code);
    }
}

#[tokio::test]
async fn test_message_is_piped_to_stdin() {
    let classifier = shell("if grep -q 'Subject: buy now'; then exit 1; else exit 0; fi");

    assert_eq!(classifier.classify(RAW).await.unwrap(), Verdict::Spam);
    assert_eq!(
        classifier.classify(b"Subject: hi\r\n\r\n").await.unwrap(),
        Verdict::NotSpam
    );
}

#[tokio::test]
async fn test_classifier_ignoring_stdin() {
    let classifier = shell("exit 1");
    let verdict = classifier.classify(RAW).await.unwrap();
    assert_eq!(verdict, Verdict::Spam);
}

#[tokio::test]
async fn test_missing_executable() {
    let classifier = CommandClassifier::new(
        "definitely-not-a-spam-classifier".to_string(),
        vec![],
        Duration::from_secs(5),
    );

    let result = classifier.classify(RAW).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().starts_with("Failed to spawn"));
}

#[tokio::test]
async fn test_timeout() {
    let classifier = CommandClassifier::new(
        "sh".to_string(),
        vec!["-c".to_string(), "sleep 5".to_string()],
        Duration::from_millis(200),
    );

    let result = classifier.classify(RAW).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("timed out"));
}

//! Integration tests for the remote speech service client
//!
//! ## Running Tests
//!
//! ### Mock tests (no API key needed):
//! ```bash
//! cargo test --test remote_service mock_
//! ```
//!
//! ### Integration tests (requires API key):
//! ```bash
//! export ELEVENLABS_API_KEY=your-key
//! cargo test --test remote_service integration_
//! ```

use voice_studio::remote::{is_api_key_configured, ElevenLabsClient, SpeechService, VoiceSettings};
use voice_studio::RemoteServiceError;

// ============================================================================
// Mock Tests - a one-shot local HTTP server stands in for the service
// ============================================================================

mod mock_tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    /// Serve one canned response. Returns the base URL and the raw request.
    async fn serve_once(
        status: u16,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let _ = tx.send(request);

            let head = format!(
                "HTTP/1.1 {} Mock\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                status,
                content_type,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{}/v1", addr), rx)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(base_url: &str) -> ElevenLabsClient {
        ElevenLabsClient::from_env(base_url, "eleven_monolingual_v1")
            .with_api_key("test-key")
            .with_http_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn mock_list_voices_maps_presets() {
        let body = br#"{"voices":[
            {"voice_id":"21m00Tcm4TlvDq8ikWAM","name":"Rachel","preview_url":"https://example.com/r.mp3","category":"premade"},
            {"voice_id":"AZnzlk1XvdvUeBnXmlld","name":"Domi"}
        ]}"#;
        let (url, request) = serve_once(200, "application/json", body.to_vec()).await;

        let voices = client(&url).list_voices().await.unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].name, "Rachel");
        assert_eq!(voices[0].preview_url.as_deref(), Some("https://example.com/r.mp3"));
        assert_eq!(voices[1].preview_url, None);
        assert!(voices.iter().all(|v| !v.is_custom));

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /v1/voices "));
        assert!(request.to_ascii_lowercase().contains("xi-api-key: test-key"));
    }

    #[tokio::test]
    async fn mock_synthesize_posts_settings_and_returns_audio() {
        let audio = vec![0xFFu8, 0xFB, 0x90, 0x44, 0x00];
        let (url, request) = serve_once(200, "audio/mpeg", audio.clone()).await;

        let settings = VoiceSettings {
            stability: 0.5,
            similarity_boost: 0.75,
        };
        let blob = client(&url)
            .synthesize("21m00Tcm4TlvDq8ikWAM", "hello", settings)
            .await
            .unwrap();
        assert_eq!(blob.bytes(), &audio[..]);
        assert_eq!(blob.content_type(), "audio/mpeg");

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /v1/text-to-speech/21m00Tcm4TlvDq8ikWAM "));
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("accept: audio/mpeg"));
        assert!(lower.contains("xi-api-key: test-key"));

        let body_start = request.find("\r\n\r\n").unwrap() + 4;
        let body: serde_json::Value = serde_json::from_str(&request[body_start..]).unwrap();
        assert_eq!(body["text"], "hello");
        assert_eq!(body["model_id"], "eleven_monolingual_v1");
        assert_eq!(body["voice_settings"]["stability"], 0.5);
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);
    }

    #[tokio::test]
    async fn mock_api_error_carries_status_and_detail() {
        let body = br#"{"detail":{"status":"invalid_api_key","message":"Invalid API key"}}"#;
        let (url, _request) = serve_once(401, "application/json", body.to_vec()).await;

        let err = client(&url).list_voices().await.unwrap_err();
        match err {
            RemoteServiceError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn mock_malformed_voice_list_is_parse_error() {
        let (url, _request) = serve_once(200, "application/json", b"{\"voices\":42}".to_vec()).await;

        let err = client(&url).list_voices().await.unwrap_err();
        assert!(matches!(err, RemoteServiceError::Parse(_)));
    }

    #[tokio::test]
    async fn mock_unreachable_service_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}/v1", addr))
            .synthesize("v", "hello", VoiceSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteServiceError::Network(_)));
    }

    #[test]
    fn mock_is_api_key_configured_reflects_env() {
        let expected = std::env::var("ELEVENLABS_API_KEY")
            .map(|k| !k.is_empty())
            .unwrap_or(false);
        assert_eq!(is_api_key_configured(), expected);
    }
}

// ============================================================================
// Integration Tests - Require ELEVENLABS_API_KEY
// ============================================================================

mod integration_tests {
    use super::*;

    fn skip_if_no_api_key() -> bool {
        if !is_api_key_configured() {
            eprintln!("Skipping: ELEVENLABS_API_KEY not set");
            return true;
        }
        false
    }

    #[tokio::test]
    async fn integration_list_voices_returns_presets() {
        if skip_if_no_api_key() {
            return;
        }

        let voices = ElevenLabsClient::default().list_voices().await.unwrap();
        assert!(!voices.is_empty());
    }

    #[tokio::test]
    async fn integration_synthesize_returns_mpeg_audio() {
        if skip_if_no_api_key() {
            return;
        }

        let client = ElevenLabsClient::default();
        let voices = client.list_voices().await.unwrap();
        let Some(voice) = voices.first() else {
            eprintln!("Skipping: account has no voices");
            return;
        };

        let blob = client
            .synthesize(&voice.voice_id, "Hello from the test suite.", VoiceSettings::default())
            .await
            .unwrap();
        assert!(!blob.is_empty());
        assert!(blob.is_audio());
    }
}

/*
 * auth_exchange.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * End-to-end AUTHENTICATE / AUTH exchanges against a scripted server on an
 * in-memory duplex pipe. No network access.
 *
 * Run with:
 *   cargo test -p oauthsasl_core --test auth_exchange
 */

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::{
    duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::task::JoinHandle;

use oauthsasl_core::oauth::OAuthConsumer;
use oauthsasl_core::protocol::imap::{ImapClientError, ImapSession};
use oauthsasl_core::protocol::smtp::{SmtpClientError, SmtpSession};
use oauthsasl_core::sasl::{
    create_client, Credential, FixedName, NegotiatedProperty, OAuthNonce, Protocol, SaslClient,
    SaslError, XOAuth2Response, XoauthResponse,
};

const EMAIL: &str = "oauth@gmail.com";
const TOKEN: &str = "ya29.abc";
const XOAUTH2_B64: &str = "dXNlcj1vYXV0aEBnbWFpbC5jb20BYXV0aD1CZWFyZXIgeWEyOS5hYmMBAQ==";
const ERROR_JSON: &[u8] = br#"{"status":"401","schemes":"bearer","scope":"https://mail.google.com/"}"#;

/// Scripted peer: read a line from the client, assert on it, write a canned reply.
struct Server {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl Server {
    fn new(io: DuplexStream) -> Self {
        let (r, w) = tokio::io::split(io);
        Self {
            lines: BufReader::new(r).lines(),
            writer: w,
        }
    }

    async fn send(&mut self, s: &str) {
        self.writer.write_all(s.as_bytes()).await.unwrap();
    }

    async fn expect(&mut self) -> String {
        self.lines.next_line().await.unwrap().expect("client closed early")
    }
}

fn spawn_server<F, Fut>(script: F) -> (DuplexStream, JoinHandle<()>)
where
    F: FnOnce(Server) -> Fut,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let (client_io, server_io) = duplex(8192);
    let handle = tokio::spawn(script(Server::new(server_io)));
    (client_io, handle)
}

fn xoauth2_client() -> impl SaslClient {
    XOAuth2Response::new(TOKEN).into_client(FixedName::new(EMAIL))
}

#[tokio::test]
async fn imap_xoauth2_with_sasl_ir() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("* OK [CAPABILITY IMAP4rev1 SASL-IR AUTH=XOAUTH2 AUTH=PLAIN] Gimap ready\r\n")
            .await;
        let line = s.expect().await;
        assert_eq!(line, format!("A0001 AUTHENTICATE XOAUTH2 {}", XOAUTH2_B64));
        s.send("* CAPABILITY IMAP4rev1 UNSELECT IDLE\r\nA0001 OK oauth@gmail.com authenticated (Success)\r\n")
            .await;
        assert_eq!(s.expect().await, "A0002 LOGOUT");
        s.send("* BYE LOGOUT Requested\r\nA0002 OK 73 good day (Success)\r\n").await;
    });

    let mut session = ImapSession::start(io).await.unwrap();
    let mut client = xoauth2_client();
    session.authenticate(&mut client).await.unwrap();
    assert!(session.is_authenticated());
    assert!(client.is_complete());
    assert!(session.capabilities().iter().any(|c| c == "IDLE"));
    session.logout().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn imap_xoauth2_without_sasl_ir_waits_for_continuation() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("* OK [CAPABILITY IMAP4rev1 AUTH=XOAUTH2] ready\r\n").await;
        assert_eq!(s.expect().await, "A0001 AUTHENTICATE XOAUTH2");
        s.send("+ \r\n").await;
        assert_eq!(s.expect().await, XOAUTH2_B64);
        s.send("A0001 OK done\r\n").await;
    });

    let mut session = ImapSession::start(io).await.unwrap();
    let mut client = xoauth2_client();
    session.authenticate(&mut client).await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn imap_xoauth2_error_challenge_is_acknowledged() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("* OK [CAPABILITY IMAP4rev1 SASL-IR AUTH=XOAUTH2] ready\r\n").await;
        let line = s.expect().await;
        assert!(line.starts_with("A0001 AUTHENTICATE XOAUTH2 "));
        s.send(&format!("+ {}\r\n", STANDARD.encode(ERROR_JSON))).await;
        assert_eq!(s.expect().await, "");
        s.send("A0001 NO [AUTHENTICATIONFAILED] Invalid credentials (Failure)\r\n")
            .await;
    });

    let mut session = ImapSession::start(io).await.unwrap();
    let mut client = xoauth2_client();
    let err = session.authenticate(&mut client).await.unwrap_err();
    match err {
        ImapClientError::AuthenticationFailed(text) => {
            assert!(text.contains("Invalid credentials"))
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!session.is_authenticated());
    server.await.unwrap();
}

#[tokio::test]
async fn imap_legacy_xoauth_signed_request() {
    let expected = "GET https://mail.google.com/mail/b/xoauth@gmail.com/imap/ \
oauth_signature_method=\"HMAC-SHA1\",oauth_token=\"1%2Fabc-def_ghi\",oauth_consumer_key=\"anonymous\",\
oauth_timestamp=\"1300000000\",oauth_nonce=\"0123456789abcdef\",oauth_version=\"1.0\",\
oauth_signature=\"GgV2rUi9T%2Btiau9Ao5k%2F%2FxUdDHA%3D\"";

    let (io, server) = spawn_server(move |mut s| async move {
        s.send("* OK [CAPABILITY IMAP4rev1 AUTH=XOAUTH] ready\r\n").await;
        assert_eq!(s.expect().await, "A0001 AUTHENTICATE XOAUTH");
        s.send("+\r\n").await;
        let b64 = s.expect().await;
        let decoded = STANDARD.decode(b64).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), expected);
        s.send("A0001 OK xoauth@gmail.com authenticated\r\n").await;
    });

    let mut client = XoauthResponse::new(
        Protocol::Imap,
        "1/abc-def_ghi",
        "s3cr3t/+",
        OAuthConsumer::anonymous(),
    )
    .with_nonce(OAuthNonce::Fixed {
        nonce: "0123456789abcdef".to_string(),
        timestamp: 1_300_000_000,
    })
    .into_client(FixedName::new("xoauth@gmail.com"));

    let mut session = ImapSession::start(io).await.unwrap();
    session.authenticate(&mut client).await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn imap_with_factory_client() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("* OK [CAPABILITY IMAP4rev1 SASL-IR AUTH=XOAUTH2] ready\r\n").await;
        assert_eq!(s.expect().await, format!("A0001 AUTHENTICATE XOAUTH2 {}", XOAUTH2_B64));
        s.send("A0001 OK done\r\n").await;
    });

    let credential = Credential::new(EMAIL, TOKEN);
    let callback = credential.name_callback();
    let mut client = create_client(&["PLAIN", "XOAUTH2"], "imaps", &credential, callback)
        .expect("XOAUTH2 client");
    let mut session = ImapSession::start(io).await.unwrap();
    session.authenticate(client.as_mut()).await.unwrap();
    assert!(client.is_complete());
    server.await.unwrap();
}

#[tokio::test]
async fn smtp_xoauth2_success() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("220 smtp.gmail.com ESMTP ready\r\n").await;
        assert_eq!(s.expect().await, "EHLO client.example");
        s.send("250-smtp.gmail.com at your service\r\n250-SIZE 35882577\r\n250-AUTH LOGIN PLAIN XOAUTH2 XOAUTH\r\n250 SMTPUTF8\r\n")
            .await;
        assert_eq!(s.expect().await, format!("AUTH XOAUTH2 {}", XOAUTH2_B64));
        s.send("235 2.7.0 Accepted\r\n").await;
        assert_eq!(s.expect().await, "QUIT");
        s.send("221 2.0.0 closing connection\r\n").await;
    });

    let mut session = SmtpSession::start(io, "client.example").await.unwrap();
    assert!(!session.ehlo_info().starttls);
    let mut client = xoauth2_client();
    session.authenticate(&mut client).await.unwrap();
    assert!(session.is_authenticated());
    session.quit().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn smtp_xoauth2_error_then_535() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("220 smtp.gmail.com ESMTP ready\r\n").await;
        s.expect().await;
        s.send("250-smtp.gmail.com\r\n250 AUTH XOAUTH2\r\n").await;
        assert!(s.expect().await.starts_with("AUTH XOAUTH2 "));
        s.send(&format!("334 {}\r\n", STANDARD.encode(ERROR_JSON))).await;
        assert_eq!(s.expect().await, "");
        s.send("535-5.7.8 Username and Password not accepted.\r\n535 5.7.8 https://support.google.com/mail\r\n")
            .await;
    });

    let mut session = SmtpSession::start(io, "localhost").await.unwrap();
    let mut client = xoauth2_client();
    let err = session.authenticate(&mut client).await.unwrap_err();
    assert!(matches!(err, SmtpClientError::AuthenticationFailed { code: 535, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn smtp_legacy_xoauth_uses_smtp_url() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("220 mx ESMTP\r\n").await;
        s.expect().await;
        s.send("250-mx\r\n250 AUTH XOAUTH\r\n").await;
        let line = s.expect().await;
        let b64 = line.strip_prefix("AUTH XOAUTH ").expect("initial response on AUTH line");
        let decoded = String::from_utf8(STANDARD.decode(b64).unwrap()).unwrap();
        assert!(decoded.starts_with("GET https://mail.google.com/mail/b/user@example.com/smtp/ "));
        assert!(decoded.contains("oauth_consumer_key=\"ck\""));
        s.send("235 ok\r\n").await;
    });

    let credential = Credential::new("user@example.com", "tok")
        .with_token_secret("sec")
        .with_consumer("ck", "cs");
    let mut client = create_client(&["XOAUTH"], "smtp", &credential, credential.name_callback())
        .expect("XOAUTH client");
    let mut session = SmtpSession::start(io, "localhost").await.unwrap();
    session.authenticate(client.as_mut()).await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn imap_rejected_challenge_cancels_exchange() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("* OK [CAPABILITY IMAP4rev1 AUTH=XOAUTH] ready\r\n").await;
        assert_eq!(s.expect().await, "A0001 AUTHENTICATE XOAUTH");
        s.send("+ Zm9v\r\n").await;
        assert_eq!(s.expect().await, "*");
        s.send("A0001 BAD AUTHENTICATE cancelled\r\n").await;
        assert_eq!(s.expect().await, "A0002 LOGOUT");
        s.send("A0002 OK bye\r\n").await;
    });

    let credential = Credential::new(EMAIL, "1/tok").with_token_secret("sec");
    let mut client = create_client(&["XOAUTH"], "imaps", &credential, credential.name_callback())
        .expect("XOAUTH client");
    let mut session = ImapSession::start(io).await.unwrap();
    let err = session.authenticate(client.as_mut()).await.unwrap_err();
    assert!(matches!(err, ImapClientError::Sasl(SaslError::ProtocolViolation(_))));
    assert!(!session.is_authenticated());
    session.logout().await.unwrap();
    server.await.unwrap();
}

/// Answers the initial request, then refuses any server challenge.
struct RefusesChallenges;

impl SaslClient for RefusesChallenges {
    fn mechanism_name(&self) -> &'static str {
        "XOAUTH2"
    }

    fn has_initial_response(&self) -> bool {
        true
    }

    fn evaluate_challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        if challenge.is_empty() {
            Ok(b"initial".to_vec())
        } else {
            Err(SaslError::ProtocolViolation("unexpected challenge".to_string()))
        }
    }

    fn is_complete(&self) -> bool {
        false
    }

    fn negotiated_property(
        &self,
        _name: &str,
    ) -> Result<Option<NegotiatedProperty<'_>>, SaslError> {
        Err(SaslError::IllegalState("not complete"))
    }

    fn wrap(&mut self, _outgoing: &[u8]) -> Result<Vec<u8>, SaslError> {
        Err(SaslError::ProtocolViolation("no security layer".to_string()))
    }

    fn unwrap(&mut self, _incoming: &[u8]) -> Result<Vec<u8>, SaslError> {
        Err(SaslError::ProtocolViolation("no security layer".to_string()))
    }
}

#[tokio::test]
async fn smtp_rejected_challenge_cancels_exchange() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("220 mx ESMTP\r\n").await;
        s.expect().await;
        s.send("250-mx\r\n250 AUTH XOAUTH2\r\n").await;
        assert_eq!(s.expect().await, format!("AUTH XOAUTH2 {}", STANDARD.encode("initial")));
        s.send("334 Zm9v\r\n").await;
        assert_eq!(s.expect().await, "*");
        s.send("501 5.7.0 Authentication cancelled\r\n").await;
        assert_eq!(s.expect().await, "QUIT");
        s.send("221 bye\r\n").await;
    });

    let mut session = SmtpSession::start(io, "localhost").await.unwrap();
    let err = session.authenticate(&mut RefusesChallenges).await.unwrap_err();
    assert!(matches!(err, SmtpClientError::Sasl(SaslError::ProtocolViolation(_))));
    assert!(!session.is_authenticated());
    session.quit().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn smtp_malformed_challenge_cancels_exchange() {
    let (io, server) = spawn_server(|mut s| async move {
        s.send("220 mx ESMTP\r\n").await;
        s.expect().await;
        s.send("250-mx\r\n250 AUTH XOAUTH2\r\n").await;
        s.expect().await;
        s.send("334 not*base64\r\n").await;
        assert_eq!(s.expect().await, "*");
        s.send("501 cancelled\r\n").await;
    });

    let mut session = SmtpSession::start(io, "localhost").await.unwrap();
    let mut client = xoauth2_client();
    let err = session.authenticate(&mut client).await.unwrap_err();
    assert!(matches!(err, SmtpClientError::Protocol(_)));
    server.await.unwrap();
}

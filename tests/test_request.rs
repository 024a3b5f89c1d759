mod common;

use common::ChunkReader;
use httpwire::config::ParserConfig;
use httpwire::http::headers::HeaderError;
use httpwire::http::parser::ParseError;
use httpwire::http::request::{ParserState, Request};

const CURL_GET: &str =
    "GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n";

async fn parse_chunked(data: &str, bytes_per_read: usize) -> Result<Request, ParseError> {
    let mut reader = ChunkReader::new(data, bytes_per_read);
    Request::from_reader(&mut reader).await
}

#[tokio::test]
async fn test_good_get_request_line() {
    let r = parse_chunked(CURL_GET, 3).await.unwrap();

    assert_eq!(r.request_line.method, "GET");
    assert_eq!(r.request_line.target, "/");
    assert_eq!(r.request_line.http_version, "1.1");
    assert!(r.is_done());
}

#[tokio::test]
async fn test_good_get_request_line_with_path() {
    let data = "GET /coffee HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n";
    let r = parse_chunked(data, 1).await.unwrap();

    assert_eq!(r.method(), "GET");
    assert_eq!(r.target(), "/coffee");
    assert_eq!(r.request_line.http_version, "1.1");
}

#[tokio::test]
async fn test_http_1_0_accepted() {
    let r = parse_chunked("GET /old HTTP/1.0\r\n\r\n", 4).await.unwrap();

    assert_eq!(r.request_line.http_version, "1.0");
}

#[tokio::test]
async fn test_invalid_number_of_parts_in_request_line() {
    let data = "/coffee HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n";
    let result = parse_chunked(data, 2).await;

    assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
}

#[tokio::test]
async fn test_good_post_request_with_body() {
    let data = "POST /coffee HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\nContent-Length: 22\r\n\r\n{\"flavour\":\"darkmode\"}";
    let r = parse_chunked(data, 1).await.unwrap();

    assert_eq!(r.method(), "POST");
    assert_eq!(r.target(), "/coffee");
    assert_eq!(r.body, b"{\"flavour\":\"darkmode\"}");
}

#[tokio::test]
async fn test_invalid_method() {
    let data = "Get /coffee HTTP/1.1\r\nHost: localhost:42069\r\n\r\n";
    let result = parse_chunked(data, 3).await;

    assert!(matches!(result, Err(ParseError::InvalidMethod(m)) if m == "Get"));
}

#[tokio::test]
async fn test_invalid_version() {
    let data = "GET /coffee HTTP/2.2\r\nHost: localhost:42069\r\n\r\n";
    let result = parse_chunked(data, 3).await;

    assert!(matches!(result, Err(ParseError::InvalidVersion(v)) if v == "HTTP/2.2"));
}

#[tokio::test]
async fn test_missing_version_prefix() {
    let result = parse_chunked("GET /coffee 1.1\r\n\r\n", 3).await;

    assert!(matches!(result, Err(ParseError::InvalidVersion(_))));
}

#[tokio::test]
async fn test_invalid_target() {
    let result = parse_chunked("GET coffee HTTP/1.1\r\n\r\n", 3).await;

    assert!(matches!(result, Err(ParseError::InvalidTarget(t)) if t == "coffee"));
}

#[tokio::test]
async fn test_standard_headers() {
    let r = parse_chunked(CURL_GET, 3).await.unwrap();

    assert_eq!(r.headers.get("host"), Some("localhost:42069"));
    assert_eq!(r.headers.get("user-agent"), Some("curl/7.81.0"));
    assert_eq!(r.headers.get("accept"), Some("*/*"));
    assert_eq!(r.headers.len(), 3);
}

#[tokio::test]
async fn test_malformed_header() {
    let result = parse_chunked("GET / HTTP/1.1\r\nHost localhost\r\n\r\n", 3).await;

    assert!(matches!(
        result,
        Err(ParseError::Header(HeaderError::MalformedLine))
    ));
}

#[tokio::test]
async fn test_header_key_with_space() {
    let result = parse_chunked("GET / HTTP/1.1\r\nHost localhost:42069\r\n\r\n", 3).await;

    assert!(matches!(
        result,
        Err(ParseError::Header(HeaderError::InvalidKey(key))) if key == "Host localhost"
    ));
}

#[tokio::test]
async fn test_space_before_colon_rejected() {
    let result = parse_chunked("GET / HTTP/1.1\r\nHost : localhost\r\n\r\n", 5).await;

    assert!(matches!(
        result,
        Err(ParseError::Header(HeaderError::MalformedLine))
    ));
}

#[tokio::test]
async fn test_empty_headers() {
    let r = parse_chunked("GET / HTTP/1.1\r\n\r\n", 2).await.unwrap();

    assert!(r.headers.is_empty());
    assert!(r.body.is_empty());
}

#[tokio::test]
async fn test_duplicate_headers() {
    let data = "GET / HTTP/1.1\r\nAccept: text/html\r\nAccept: application/json\r\n\r\n";
    let r = parse_chunked(data, 5).await.unwrap();

    assert_eq!(r.header("accept"), Some("text/html, application/json"));
}

#[tokio::test]
async fn test_case_insensitive_headers() {
    let data = "GET / HTTP/1.1\r\nHOST: localhost\r\nhost: example.com\r\n\r\n";
    let r = parse_chunked(data, 6).await.unwrap();

    assert_eq!(r.header("host"), Some("localhost, example.com"));
    assert_eq!(r.header("HOST"), Some("localhost, example.com"));
}

#[tokio::test]
async fn test_missing_end_of_headers() {
    let result = parse_chunked("GET / HTTP/1.1\r\nHost: localhost", 5).await;

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[tokio::test]
async fn test_empty_stream_is_incomplete() {
    let result = parse_chunked("", 5).await;

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[tokio::test]
async fn test_standard_body() {
    let data = "POST /submit HTTP/1.1\r\n\
                Host: localhost:42069\r\n\
                Content-Length: 13\r\n\
                \r\n\
                hello world!\n";
    let r = parse_chunked(data, 3).await.unwrap();

    assert_eq!(r.body, b"hello world!\n");
}

#[tokio::test]
async fn test_body_shorter_than_reported_length() {
    let data = "POST /submit HTTP/1.1\r\n\
                Host: localhost:42069\r\n\
                Content-Length: 20\r\n\
                \r\n\
                partial content.";
    let result = parse_chunked(data, 3).await;

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[tokio::test]
async fn test_empty_body_with_zero_length() {
    let data = "POST /submit HTTP/1.1\r\n\
                Host: localhost:42069\r\n\
                Content-Length: 0\r\n\
                \r\n";
    let r = parse_chunked(data, 3).await.unwrap();

    assert!(r.body.is_empty());
}

#[tokio::test]
async fn test_invalid_content_length() {
    let data = "POST / HTTP/1.1\r\nContent-Length: twelve\r\n\r\nhello";
    let result = parse_chunked(data, 4).await;

    assert!(matches!(result, Err(ParseError::InvalidContentLength(v)) if v == "twelve"));
}

#[tokio::test]
async fn test_body_longer_than_content_length() {
    let data = "POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcdef";
    let config = ParserConfig {
        initial_buffer_size: 1024,
        ..ParserConfig::default()
    };

    let mut reader = ChunkReader::new(data, data.len());
    let result = Request::from_reader_with(&mut reader, &config).await;

    assert!(matches!(result, Err(ParseError::BodyTooLong)));
}

#[test]
fn test_body_longer_than_content_length_in_one_step() {
    let mut request = Request::new();
    let result = request.parse(b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcd");

    assert!(matches!(result, Err(ParseError::BodyTooLong)));
}

#[tokio::test]
async fn test_request_line_longer_than_buffer_limit() {
    let config = ParserConfig {
        initial_buffer_size: 8,
        max_buffer_size: 16,
        ..ParserConfig::default()
    };

    let mut reader = ChunkReader::new("GET /a/very/long/path HTTP/1.1\r\n\r\n", 4);
    let result = Request::from_reader_with(&mut reader, &config).await;

    assert!(matches!(result, Err(ParseError::HeadTooLarge { limit: 16 })));
}

#[tokio::test]
async fn test_line_exactly_at_buffer_limit() {
    let config = ParserConfig {
        initial_buffer_size: 5,
        max_buffer_size: 16,
        ..ParserConfig::default()
    };

    // request line is 16 bytes with its CRLF
    let mut reader = ChunkReader::new("GET / HTTP/1.1\r\n\r\n", 3);
    let r = Request::from_reader_with(&mut reader, &config).await.unwrap();
    assert_eq!(r.target(), "/");

    let mut reader = ChunkReader::new("GET /a HTTP/1.1\r\n\r\n", 3);
    let result = Request::from_reader_with(&mut reader, &config).await;
    assert!(matches!(result, Err(ParseError::HeadTooLarge { limit: 16 })));
}

#[tokio::test]
async fn test_long_line_under_non_power_of_two_limit() {
    let config = ParserConfig {
        initial_buffer_size: 8,
        max_buffer_size: 100,
        ..ParserConfig::default()
    };
    let target = format!("/{}", "a".repeat(70));
    let data = format!("GET {} HTTP/1.1\r\nHost: x\r\n\r\n", target);

    let mut reader = ChunkReader::new(data, 7);
    let r = Request::from_reader_with(&mut reader, &config).await.unwrap();

    assert_eq!(r.target(), target);
    assert_eq!(r.header("host"), Some("x"));
}

#[tokio::test]
async fn test_content_length_over_limit() {
    let config = ParserConfig {
        max_body_size: 4,
        ..ParserConfig::default()
    };

    let mut reader = ChunkReader::new("POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\n0123456789", 3);
    let result = Request::from_reader_with(&mut reader, &config).await;

    assert!(matches!(
        result,
        Err(ParseError::BodyTooLarge {
            length: 10,
            limit: 4
        })
    ));
}

#[tokio::test]
async fn test_result_independent_of_read_size() {
    let requests = [
        CURL_GET,
        "POST /submit HTTP/1.1\r\nHost: localhost:42069\r\nContent-Length: 13\r\n\r\nhello world!\n",
        "PUT /x HTTP/1.0\r\nA: 1\r\na: 2\r\n\r\n",
    ];

    for data in requests {
        let whole = parse_chunked(data, data.len()).await.unwrap();

        for bytes_per_read in 1..=data.len() {
            let fragmented = parse_chunked(data, bytes_per_read).await.unwrap();
            assert_eq!(fragmented, whole, "read size {}", bytes_per_read);
        }
    }
}

#[tokio::test]
async fn test_curl_request_one_and_three_byte_reads() {
    for bytes_per_read in [1, 3] {
        let r = parse_chunked(CURL_GET, bytes_per_read).await.unwrap();

        assert_eq!(r.method(), "GET");
        assert_eq!(r.target(), "/");
        assert_eq!(r.request_line.http_version, "1.1");
        assert_eq!(r.header("host"), Some("localhost:42069"));
        assert_eq!(r.header("user-agent"), Some("curl/7.81.0"));
        assert_eq!(r.header("accept"), Some("*/*"));
    }
}

#[test]
fn test_state_moves_forward() {
    let mut request = Request::new();
    assert_eq!(request.state(), ParserState::ParsingRequestLine);

    request.parse(b"POST / HTTP/1.1\r\n").unwrap();
    assert_eq!(request.state(), ParserState::ParsingHeaders);

    request.parse(b"Content-Length: 2\r\n\r\n").unwrap();
    assert_eq!(request.state(), ParserState::ParsingBody);

    request.parse(b"hi").unwrap();
    assert_eq!(request.state(), ParserState::Done);

    assert_eq!(request.parse(b"more").unwrap(), 0);
    assert_eq!(request.body, b"hi");
}

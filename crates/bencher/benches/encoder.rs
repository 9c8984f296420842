use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use ferry_http::codec::HeadEncoder;
use ferry_http::protocol::{ConnectionMode, HttpVersion, Request, Response};
use http::{Method, StatusCode};
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Encoder;

fn request() -> Request {
    let mut request = Request::new(Method::POST, "http://api.example.com:8443/v1/items?page=3", HttpVersion::Http11)
        .expect("url should be valid");
    let header = request.header_mut();
    for (key, value) in [
        ("Content-Type", "application/json"),
        ("Accept", "application/json"),
        ("User-Agent", "ferry-http/0.1"),
        ("X-Request-Id", "3c0d8f4e-9b1a-4f6e-a2d7-5e8c1b0f9a34"),
    ] {
        header.add(key, value).expect("header should be valid");
    }
    header.set_content_length(512);
    request.set_connection_mode(ConnectionMode::KeepAlive);
    request
}

fn benchmark_encoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("head_encoder");

    let request = request();
    group.bench_function("request_head", |b| {
        let mut buffer = BytesMut::with_capacity(4 * 1024);
        b.iter(|| {
            buffer.clear();
            HeadEncoder.encode(black_box(&request), &mut buffer).expect("encoding into memory can't fail");
            black_box(buffer.len());
        });
    });

    let mut response = Response::new(HttpVersion::Http11, StatusCode::OK);
    response.header_mut().set_content_length(1024);
    group.bench_function("response_head", |b| {
        let mut buffer = BytesMut::with_capacity(4 * 1024);
        b.iter(|| {
            buffer.clear();
            HeadEncoder.encode(black_box(&response), &mut buffer).expect("encoding into memory can't fail");
            black_box(buffer.len());
        });
    });

    group.finish();
}

criterion_group!(encoder, benchmark_encoder);
criterion_main!(encoder);

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_body_stream::accept_language::AcceptLanguage;
use shiguredo_body_stream::content_disposition::ContentDisposition;
use shiguredo_body_stream::content_type::ContentType;
use shiguredo_body_stream::forwarded::Forwarded;
use shiguredo_body_stream::framing::{BodyFraming, ConnectionOptions};
use shiguredo_body_stream::link::Link;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    value: String,
    status: u16,
    headers: Vec<(String, String)>,
}

fuzz_target!(|input: FuzzInput| {
    let s = input.value.as_str();

    // Content-Type
    if let Ok(ct) = ContentType::parse(s) {
        let _ = ct.mime_type();
        let _ = ct.charset();
        let _ = ct.boundary();

        let _ = ContentType::parse(&ct.to_string());
    }

    // Content-Disposition
    if let Ok(cd) = ContentDisposition::parse(s) {
        let _ = cd.filename();
        let _ = cd.name();
        let _ = cd.to_string();
    }

    // Forwarded / X-Forwarded-For
    let list = Forwarded::parse(s);
    let _ = Forwarded::to_header_value(&list);
    let _ = Forwarded::from_x_forwarded_for(s);
    let _ = Forwarded::from_headers(&input.headers);

    // Accept-Language
    if let Ok(accept) = AcceptLanguage::parse(s) {
        assert!(!accept.items().is_empty());
        assert!(accept.preferred().count() <= accept.items().len());
        let _ = accept.negotiate(&["en", "ja-JP"]);
    }

    // Link
    let links = Link::parse(s);
    for link in &links {
        let _ = link.has_relation("next");
        let _ = link.attribute("title");
    }
    let _ = Link::to_header_value(&links);
    let _ = Link::from_headers(&input.headers);

    // フレーミング
    if let Ok(framing) = BodyFraming::for_request(&input.headers) {
        assert_ne!(framing, BodyFraming::CloseDelimited);
    }
    if let Ok(framing) = BodyFraming::for_response(input.status, &input.headers) {
        if (100..200).contains(&input.status) || input.status == 204 || input.status == 304 {
            assert!(!framing.has_body());
        }
    }
    let _ = ConnectionOptions::parse(&input.headers).is_keep_alive("HTTP/1.1");
});

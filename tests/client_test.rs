//! Integration tests for the HTTP client against a mock service.
//!
//! The mocks carry exact hit-count expectations: the call-count contracts
//! (two GETs for an ISBN resolve, one POST for a batched save) are part of
//! the client's interface.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use ol_client::{
    Book, BookAuthor, ClientError, Config, Delete, Edition, Entity, Olid, OpenLibrary, Record,
    Redirect, Work,
};

fn olid(s: &str) -> Olid {
    Olid::parse(s).unwrap()
}

fn client_for(server: &ServerGuard) -> OpenLibrary {
    OpenLibrary::new(Config::default().with_base_url(server.url())).unwrap()
}

// === Bib-key resolution ===

mod bibkey {
    use super::*;

    #[test]
    fn isbn_resolves_to_olid() {
        let mut server = Server::new();
        let bibkey = server
            .mock("GET", "/api/books.json")
            .match_query(Matcher::UrlEncoded(
                "bibkeys".into(),
                "ISBN:0374202915".into(),
            ))
            .with_body(
                json!({
                    "ISBN:0374202915": {
                        "info_url": "https://openlibrary.org/books/OL23575801M/Marie_LaVeau"
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create();

        let ol = client_for(&server);
        let resolved = ol.olid_by_isbn("0374202915").unwrap();
        assert_eq!(resolved.unwrap().as_str(), "OL23575801M");
        bibkey.assert();
    }

    #[test]
    fn unknown_isbn_is_none_not_an_error() {
        let mut server = Server::new();
        let bibkey = server
            .mock("GET", "/api/books.json")
            .match_query(Matcher::Any)
            .with_body("{}")
            .expect(1)
            .create();
        // A miss must short-circuit before any record fetch.
        let record = server
            .mock("GET", Matcher::Regex(r"^/books/.*\.json$".into()))
            .expect(0)
            .create();

        let ol = client_for(&server);
        assert!(ol.edition_by_isbn("foobar").unwrap().is_none());
        bibkey.assert();
        record.assert();
    }

    #[test]
    fn match_without_info_url_is_malformed() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/books.json")
            .match_query(Matcher::Any)
            .with_body(json!({"ISBN:1": {}}).to_string())
            .create();

        let ol = client_for(&server);
        assert!(matches!(
            ol.olid_by_isbn("1"),
            Err(ClientError::MalformedResponse { .. })
        ));
    }
}

// === Record lookup ===

mod lookup {
    use super::*;

    #[test]
    fn edition_by_isbn_chains_bibkey_then_record() {
        let mut server = Server::new();
        let bibkey = server
            .mock("GET", "/api/books.json")
            .match_query(Matcher::UrlEncoded(
                "bibkeys".into(),
                "ISBN:0374202915".into(),
            ))
            .with_body(
                json!({
                    "ISBN:0374202915": {
                        "info_url": "https://openlibrary.org/books/OL23575801M/Marie_LaVeau"
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create();
        let record = server
            .mock("GET", "/books/OL23575801M.json")
            .with_body(json!({"key": "/books/OL23575801M", "title": "test"}).to_string())
            .expect(1)
            .create();

        let ol = client_for(&server);
        let edition = ol.edition_by_isbn("0374202915").unwrap().unwrap();
        assert_eq!(edition.olid.as_str(), "OL23575801M");
        assert_eq!(edition.title.as_deref(), Some("test"));
        bibkey.assert();
        record.assert();
    }

    #[test]
    fn edition_lookup_expands_authors() {
        let mut server = Server::new();
        let record = server
            .mock("GET", "/books/OL3702561M.json")
            .with_body(
                json!({
                    "key": "/books/OL3702561M",
                    "title": "Artificial intelligence",
                    "number_of_pages": 1080,
                    "authors": [{"key": "/authors/OL440500A"}],
                    "works": [{"key": "/works/OL2896994W"}],
                    "notes": {"type": "/type/text", "value": "Includes bibliographical references."}
                })
                .to_string(),
            )
            .expect(1)
            .create();
        let author = server
            .mock("GET", "/authors/OL440500A.json")
            .with_body(
                json!({"key": "/authors/OL440500A", "name": "Stuart J. Russell"}).to_string(),
            )
            .expect(1)
            .create();

        let ol = client_for(&server);
        let edition = ol.get_edition(&olid("OL3702561M")).unwrap();
        assert_eq!(edition.work_olid.as_ref().unwrap().as_str(), "OL2896994W");
        assert_eq!(edition.pages, Some(1080));
        assert_eq!(edition.authors.len(), 1);
        assert_eq!(edition.authors[0].name, "Stuart J. Russell");
        assert_eq!(
            edition.notes.as_ref().unwrap().as_str(),
            "Includes bibliographical references."
        );
        record.assert();
        author.assert();
    }

    #[test]
    fn work_lookup_leaves_author_references_alone() {
        let mut server = Server::new();
        server
            .mock("GET", "/works/OL2896994W.json")
            .with_body(
                json!({
                    "key": "/works/OL2896994W",
                    "title": "Artificial intelligence",
                    "authors": [
                        {"type": "/type/author_role", "author": {"key": "/authors/OL440500A"}}
                    ]
                })
                .to_string(),
            )
            .create();
        let author = server
            .mock("GET", Matcher::Regex(r"^/authors/.*\.json$".into()))
            .expect(0)
            .create();

        let ol = client_for(&server);
        let work = ol.get_work(&olid("OL2896994W")).unwrap();
        assert_eq!(work.authors.len(), 1);
        assert_eq!(work.authors[0]["author"]["key"], "/authors/OL440500A");
        author.assert();
    }

    #[test]
    fn http_errors_propagate_for_every_kind() {
        let mut server = Server::new();
        for path in [
            "/works/OLnotfoundW.json",
            "/books/OLnotfoundM.json",
            "/authors/OLnotfoundA.json",
        ] {
            server.mock("GET", path).with_status(404).create();
        }

        let ol = client_for(&server);
        for target in ["OLnotfoundW", "OLnotfoundM", "OLnotfoundA"] {
            match ol.get(&olid(target)) {
                Err(ClientError::Network { source, .. }) => {
                    assert_eq!(source.status().map(|s| s.as_u16()), Some(404));
                }
                other => panic!("expected a propagated 404 for {target}, got {other:?}"),
            }
        }
    }

    #[test]
    fn bibkey_server_error_is_not_a_miss() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/books.json")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();

        let ol = client_for(&server);
        assert!(matches!(
            ol.olid_by_isbn("0374202915"),
            Err(ClientError::Network { .. })
        ));
    }

    #[test]
    fn generic_get_dispatches_on_suffix() {
        let mut server = Server::new();
        server
            .mock("GET", "/authors/OL26170A.json")
            .with_body(json!({"key": "/authors/OL26170A", "name": "Benjamin Franklin"}).to_string())
            .create();

        let ol = client_for(&server);
        match ol.get(&olid("OL26170A")).unwrap() {
            Record::Author(author) => assert_eq!(author.name, "Benjamin Franklin"),
            other => panic!("expected an author record, got {other:?}"),
        }
    }
}

// === Search and autocomplete ===

mod search {
    use super::*;

    #[test]
    fn work_search_returns_best_match() {
        let mut server = Server::new();
        let title = "The Autobiography of Benjamin Franklin";
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::UrlEncoded("title".into(), title.into()))
            .with_body(
                json!({
                    "start": 0,
                    "num_found": 1,
                    "docs": [{"key": "/works/OL2514747W", "title": title}]
                })
                .to_string(),
            )
            .create();

        let ol = client_for(&server);
        let work = ol.search_work(title).unwrap().unwrap();
        assert_eq!(work.olid.as_str(), "OL2514747W");
        assert!(work.title.unwrap().to_lowercase().contains("franklin"));
    }

    #[test]
    fn empty_search_is_none() {
        let mut server = Server::new();
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_body(json!({"start": 0, "num_found": 0, "docs": []}).to_string())
            .create();

        let ol = client_for(&server);
        assert!(ol.search_work("no such book").unwrap().is_none());
    }

    #[test]
    fn author_name_resolves_through_autocomplete() {
        let mut server = Server::new();
        let autocomplete = server
            .mock("GET", "/authors/_autocomplete")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Benjamin Franklin".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_body(
                json!([{"name": "Benjamin Franklin", "key": "/authors/OL26170A"}]).to_string(),
            )
            .expect(1)
            .create();

        let ol = client_for(&server);
        let resolved = ol.author_olid_by_name("Benjamin Franklin").unwrap();
        assert_eq!(resolved.unwrap().as_str(), "OL26170A");
        autocomplete.assert();
    }

    #[test]
    fn unmatched_author_name_is_none() {
        let mut server = Server::new();
        server
            .mock("GET", "/authors/_autocomplete")
            .match_query(Matcher::Any)
            .with_body("[]")
            .create();

        let ol = client_for(&server);
        assert!(ol.author_olid_by_name("Nobody Whatsoever").unwrap().is_none());
    }
}

// === Record creation ===

mod create_book {
    use super::*;

    fn test_book() -> Book {
        let mut book = Book::new("Alles über Mikrofone");
        book.publisher = Some("Karamanolis".to_string());
        book.publish_date = Some("1982".to_string());
        book.authors.push(BookAuthor::new("Karl Schwarzer"));
        book.add_identifier("isbn_10", "3922238246");
        book
    }

    fn mock_autocomplete(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("GET", "/authors/_autocomplete")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Karl Schwarzer".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_body(
                json!([{"name": "Karl Schwarzer", "key": "/authors/OL7292805A"}]).to_string(),
            )
            .create()
    }

    #[test]
    fn dry_run_builds_the_full_payload() {
        let mut server = Server::new();
        let autocomplete = mock_autocomplete(&mut server);

        let ol = client_for(&server);
        let payload = ol.create_book_payload(&test_book()).unwrap();
        assert_eq!(
            serde_json::Value::Object(payload),
            json!({
                "_save": "",
                "author_key": "/authors/OL7292805A",
                "author_name": "Karl Schwarzer",
                "id_name": "isbn_10",
                "id_value": "3922238246",
                "publish_date": "1982",
                "publisher": "Karamanolis",
                "title": "Alles über Mikrofone"
            })
        );
        autocomplete.assert();
    }

    #[test]
    fn submission_posts_the_dry_run_payload() {
        let mut server = Server::new();
        let _autocomplete = mock_autocomplete(&mut server);
        let add = server
            .mock("POST", "/books/add")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("_save".into(), "".into()),
                Matcher::UrlEncoded("author_key".into(), "/authors/OL7292805A".into()),
                Matcher::UrlEncoded("id_name".into(), "isbn_10".into()),
                Matcher::UrlEncoded("id_value".into(), "3922238246".into()),
                Matcher::UrlEncoded("title".into(), "Alles über Mikrofone".into()),
            ]))
            .expect(1)
            .create();

        let ol = client_for(&server);
        ol.create_book(&test_book()).unwrap();
        add.assert();
    }

    #[test]
    fn unmatched_author_uses_the_new_sentinel() {
        let mut server = Server::new();
        server
            .mock("GET", "/authors/_autocomplete")
            .match_query(Matcher::Any)
            .with_body("[]")
            .create();

        let ol = client_for(&server);
        let payload = ol.create_book_payload(&test_book()).unwrap();
        assert_eq!(payload["author_key"], "__new__");
    }

    #[test]
    fn book_without_identifier_is_rejected_before_any_call() {
        let mut server = Server::new();
        let autocomplete = server
            .mock("GET", "/authors/_autocomplete")
            .match_query(Matcher::Any)
            .expect(0)
            .create();

        let mut book = test_book();
        book.identifiers.clear();
        let ol = client_for(&server);
        assert!(matches!(
            ol.create_book_payload(&book),
            Err(ClientError::NoUsableIdentifier)
        ));
        autocomplete.assert();
    }

    #[test]
    fn book_without_author_is_rejected() {
        let server = Server::new();
        let mut book = test_book();
        book.authors.clear();
        let ol = client_for(&server);
        assert!(matches!(
            ol.create_book_payload(&book),
            Err(ClientError::NoAuthor)
        ));
    }
}

// === Batched saves ===

mod save_many {
    use super::*;

    #[test]
    fn batch_goes_out_as_one_post() {
        let mut edition = Edition::new(olid("OL123M"), Some(olid("OL12W")));
        edition.title = Some("minimal edition".to_string());
        let mut work = Work::new(olid("OL12W"));
        work.title = Some("minimal work".to_string());

        let expected = json!([edition.to_json(), work.to_json()]);
        assert_eq!(expected.as_array().unwrap().len(), 2);

        let mut server = Server::new();
        let save = server
            .mock("POST", "/api/save_many")
            .match_header("Opt", Matcher::Regex("ns=42".into()))
            .match_header("42-comment", "test comment")
            .match_body(Matcher::Json(expected))
            .expect(1)
            .create();

        let ol = client_for(&server);
        ol.save_many([&edition as &dyn Entity, &work], "test comment")
            .unwrap();
        save.assert();
    }

    #[test]
    fn pseudo_records_batch_alongside_records() {
        let delete = Delete::new(olid("OL1W"));
        let redirect = Redirect::new(olid("OL2W"), olid("OL3W"));

        let mut server = Server::new();
        let save = server
            .mock("POST", "/api/save_many")
            .match_body(Matcher::Json(json!([
                {"type": {"key": "/type/delete"}, "key": "/works/OL1W"},
                {"type": {"key": "/type/redirect"}, "key": "/works/OL2W", "location": "/works/OL3W"}
            ])))
            .expect(1)
            .create();

        let ol = client_for(&server);
        ol.save_many([&delete as &dyn Entity, &redirect], "merge duplicate works")
            .unwrap();
        save.assert();
    }

    #[test]
    fn failed_save_surfaces_the_status() {
        let mut server = Server::new();
        server.mock("POST", "/api/save_many").with_status(403).create();

        let ol = client_for(&server);
        let edition = Edition::new(olid("OL123M"), Some(olid("OL12W")));
        match ol.save_many([&edition as &dyn Entity], "comment") {
            Err(ClientError::Network { source, .. }) => {
                assert_eq!(source.status().map(|s| s.as_u16()), Some(403));
            }
            other => panic!("expected a propagated 403, got {other:?}"),
        }
    }
}

// === Login ===

mod login {
    use super::*;

    #[test]
    fn login_keeps_the_session_cookie() {
        let mut server = Server::new();
        let login = server
            .mock("POST", "/account/login")
            .match_body(Matcher::Json(
                json!({"username": "mek", "password": "hunter2"}),
            ))
            .with_header("Set-Cookie", "session=/people/mek%2C2016-10-12T00%3A48; Path=/")
            .expect(1)
            .create();

        let credentials = ol_client::Credentials {
            username: "mek".to_string(),
            password: "hunter2".to_string(),
        };
        let config = Config::default().with_base_url(server.url());
        assert!(OpenLibrary::login(config, &credentials).is_ok());
        login.assert();
    }

    #[test]
    fn login_without_cookie_is_rejected() {
        let mut server = Server::new();
        server.mock("POST", "/account/login").create();

        let credentials = ol_client::Credentials {
            username: "mek".to_string(),
            password: "hunter2".to_string(),
        };
        let config = Config::default().with_base_url(server.url());
        assert!(matches!(
            OpenLibrary::login(config, &credentials),
            Err(ClientError::LoginRejected { .. })
        ));
    }
}

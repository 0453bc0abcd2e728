mod common;

use axum::http::StatusCode;
use common::{Part, TestApp, json_body, location};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-pixels";

#[tokio::test]
async fn create_requires_a_session() {
    let mut app = TestApp::spawn().await;

    let resp = app.get("/create").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let resp = app
        .post_multipart(
            "/create",
            &[Part::Text("category_id", "4"), Part::Text("attr_title", "Dune")],
        )
        .await;
    assert_eq!(location(&resp), "/login");
    assert_eq!(app.count_rows("books").await, 0);
}

#[tokio::test]
async fn create_form_lists_categories_and_their_attributes() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login("gina", "pw").await;

    let resp = app.get("/create").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["username"], "gina");
    assert_eq!(body["allow_new_attributes"], false);
    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 25);
    let books = categories.iter().find(|c| c["id"] == 4).unwrap();
    let attrs: Vec<&str> = books["attributes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_str().unwrap())
        .collect();
    assert!(attrs.contains(&"title"));
    assert!(attrs.contains(&"isbn"));
}

#[tokio::test]
async fn listing_without_image_is_stored() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login("gina", "pw").await;

    let resp = app
        .post_multipart(
            "/create",
            &[
                Part::Text("category_id", "4"),
                Part::Text("attr_title", "Dune"),
                Part::Text("attr_price", "12"),
                Part::File {
                    name: "image",
                    filename: "",
                    content_type: "application/octet-stream",
                    bytes: b"",
                },
            ],
        )
        .await;
    assert_eq!(location(&resp), "/index");
    assert_eq!(app.flashes().await, vec!["Item listed successfully!".to_string()]);

    let resp = app.get("/item/books/1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["item"]["title"], "Dune");
    assert_eq!(body["item"]["price"], "12");
    assert!(body["item"]["image_url"].is_null());
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn listing_with_image_uploads_and_links_it() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login("gina", "pw").await;

    let resp = app
        .post_multipart(
            "/create",
            &[
                Part::Text("category_id", "4"),
                Part::Text("attr_title", "Dune"),
                Part::File {
                    name: "image",
                    filename: "../cover art.PNG",
                    content_type: "image/png",
                    bytes: PNG,
                },
            ],
        )
        .await;
    assert_eq!(location(&resp), "/index");

    let resp = app.get("/item/books/1").await;
    let body = json_body(resp).await;
    let url = body["item"]["image_url"].as_str().unwrap().to_string();
    let prefix = "https://storage.googleapis.com/gallery-images/";
    assert!(url.starts_with(prefix), "unexpected url {url}");
    let object_name = &url[prefix.len()..];
    assert!(object_name.ends_with("_cover_art.PNG"), "{object_name}");

    let stored = app.objects.get(object_name).expect("object uploaded");
    assert_eq!(stored.bytes.as_ref(), PNG);
    assert_eq!(stored.content_type, "image/png");
}

#[tokio::test]
async fn disallowed_file_type_creates_nothing() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login("gina", "pw").await;

    let resp = app
        .post_multipart(
            "/create",
            &[
                Part::Text("category_id", "4"),
                Part::Text("attr_title", "Dune"),
                Part::File {
                    name: "image",
                    filename: "payload.exe",
                    content_type: "application/octet-stream",
                    bytes: b"MZ",
                },
            ],
        )
        .await;
    assert_eq!(location(&resp), "/create");
    assert_eq!(app.flashes().await, vec!["File type not allowed.".to_string()]);
    assert_eq!(app.count_rows("books").await, 0);
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn invalid_category_and_empty_attributes_are_flashed() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login("gina", "pw").await;

    let resp = app
        .post_multipart(
            "/create",
            &[Part::Text("category_id", "99"), Part::Text("attr_title", "x")],
        )
        .await;
    assert_eq!(location(&resp), "/create");
    assert_eq!(app.flashes().await, vec!["Invalid category selected.".to_string()]);

    let resp = app
        .post_multipart(
            "/create",
            &[Part::Text("category_id", "4"), Part::Text("note", "ignored")],
        )
        .await;
    assert_eq!(location(&resp), "/create");
    assert_eq!(app.flashes().await, vec!["No attributes provided.".to_string()]);
    assert_eq!(app.count_rows("books").await, 0);
}

#[tokio::test]
async fn strict_mode_rejects_unknown_attributes() {
    let mut app = TestApp::spawn().await;
    app.signup_and_login("gina", "pw").await;

    let resp = app
        .post_multipart(
            "/create",
            &[
                Part::Text("category_id", "4"),
                Part::Text("attr_title", "Dune"),
                Part::Text("attr_signed_by", "Herbert"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/create");
    assert_eq!(app.flashes().await, vec!["Unknown attribute: signed_by".to_string()]);
    assert_eq!(app.count_rows("books").await, 0);
}

#[tokio::test]
async fn malformed_attribute_names_never_reach_sql() {
    let mut app = TestApp::spawn_with(|cfg| cfg.listings.allow_new_attributes = true).await;
    app.signup_and_login("gina", "pw").await;

    for (field, shown) in [("attr_price-usd", "price-usd"), ("attr_9lives", "9lives")] {
        let resp = app
            .post_multipart(
                "/create",
                &[
                    Part::Text("category_id", "4"),
                    Part::Text("attr_title", "Dune"),
                    Part::Text(field, "x"),
                ],
            )
            .await;
        assert_eq!(location(&resp), "/create", "{field}");
        assert_eq!(
            app.flashes().await,
            vec![format!("Invalid attribute name: {shown}")]
        );
    }
    assert_eq!(app.count_rows("books").await, 0);

    let resp = app.get("/items/4").await;
    let body = json_body(resp).await;
    let columns = body["columns"].as_array().unwrap();
    assert!(columns.iter().all(|c| !c.as_str().unwrap().contains("price-usd")));
}

#[tokio::test]
async fn evolving_mode_adds_columns_on_demand() {
    let mut app = TestApp::spawn_with(|cfg| cfg.listings.allow_new_attributes = true).await;
    app.signup_and_login("gina", "pw").await;

    for title in ["Dune", "Emma"] {
        let resp = app
            .post_multipart(
                "/create",
                &[
                    Part::Text("category_id", "4"),
                    Part::Text("attr_title", title),
                    Part::Text("attr_Signed_By", "yes"),
                ],
            )
            .await;
        assert_eq!(location(&resp), "/index");
    }

    let resp = app.get("/items/4").await;
    let body = json_body(resp).await;
    let columns: Vec<&str> = body["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert_eq!(columns.iter().filter(|c| **c == "signed_by").count(), 1);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Emma");
    assert_eq!(items[0]["signed_by"], "yes");
}

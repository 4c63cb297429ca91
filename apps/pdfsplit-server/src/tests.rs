//! HTTP tests for the pdfsplit server
//!
//! Drive the real router through axum-test with in-memory PDFs.
//!
//! Test categories:
//! - Bookmark export (success, missing outline, bad input)
//! - CSV split (selection, validation errors, CSV edge cases)

#[cfg(test)]
mod api_tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::{TestResponse, TestServer};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use pdfsplit_core::fixtures::{
        create_test_pdf, encrypted_pdf, page_count, pdf_with_outline, unzip,
    };

    use crate::app;

    const TRUNCATED_PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";

    fn server() -> TestServer {
        TestServer::new(app(8 * 1024 * 1024)).unwrap()
    }

    fn pdf_part(bytes: Vec<u8>) -> Part {
        Part::bytes(bytes)
            .file_name("doc.pdf")
            .mime_type("application/pdf")
    }

    fn chapters_pdf() -> Vec<u8> {
        pdf_with_outline(
            3,
            &[
                (0, "Chapter 1", 1),
                (1, "Section 1.1", 2),
                (1, "Section 1.2", 3),
                (0, "Chapter 2", 3),
            ],
        )
    }

    async fn export(pdf: Vec<u8>) -> TestResponse {
        server()
            .post("/api/bookmarks/zip")
            .multipart(MultipartForm::new().add_part("pdf", pdf_part(pdf)))
            .await
    }

    async fn split_raw(pdf: Vec<u8>, csv: Vec<u8>) -> TestResponse {
        let form = MultipartForm::new().add_part("pdf", pdf_part(pdf)).add_part(
            "csvfile",
            Part::bytes(csv)
                .file_name("ranges.csv")
                .mime_type("text/csv"),
        );
        server().post("/api/split").multipart(form).await
    }

    async fn split(csv: &str) -> TestResponse {
        split_raw(create_test_pdf(4), csv.as_bytes().to_vec()).await
    }

    fn detail(response: &TestResponse) -> String {
        response.json::<Value>()["detail"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }

    fn fragments(response: &TestResponse) -> Vec<(String, Vec<u8>)> {
        unzip(response.as_bytes())
    }

    // ============================================================
    // Health
    // ============================================================

    #[tokio::test]
    async fn test_health() {
        let response = server().get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    // ============================================================
    // Bookmark export
    // ============================================================

    #[tokio::test]
    async fn test_export_multilevel_bookmarks() {
        let response = export(chapters_pdf()).await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/zip");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"bookmarks_by_depth.zip\""
        );

        let files: Vec<(String, String)> = fragments(&response)
            .into_iter()
            .map(|(name, data)| (name, String::from_utf8(data).unwrap()))
            .collect();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "bookmarks_level_0.csv");
        assert!(files[0].1.contains("\"Chapter 1\",1,2"));
        assert!(files[0].1.contains("\"Chapter 2\",3,3"));
        assert_eq!(files[1].0, "bookmarks_level_1.csv");
        assert!(files[1].1.contains("\"Section 1.1\",2,2"));
        assert!(files[1].1.contains("\"Section 1.2\",3,3"));
    }

    #[tokio::test]
    async fn test_export_no_bookmarks_returns_404() {
        let response = export(create_test_pdf(1)).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(detail(&response), "No bookmarks found in the PDF");
    }

    #[tokio::test]
    async fn test_export_invalid_pdf_returns_400() {
        for bytes in [b"hello world".to_vec(), TRUNCATED_PDF.to_vec()] {
            let response = export(bytes).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert!(detail(&response).to_lowercase().contains("invalid pdf file"));
        }
    }

    #[tokio::test]
    async fn test_export_encrypted_pdf_rejected() {
        let response = export(encrypted_pdf(1)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(detail(&response)
            .to_lowercase()
            .contains("pdf is password-protected"));
    }

    #[tokio::test]
    async fn test_export_missing_field_returns_400() {
        let response = server()
            .post("/api/bookmarks/zip")
            .multipart(MultipartForm::new().add_text("other", "x"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(detail(&response).contains("'pdf'"));
    }

    // ============================================================
    // Split
    // ============================================================

    #[tokio::test]
    async fn test_split_selected_rows() {
        let response = split("split,name,from,to\ny,Part A,1,2\nn,Ignore Me,2,3\ny,Part B,3,4").await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/zip");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"chapters.zip\""
        );

        let files = fragments(&response);
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|(name, _)| name.contains("Part A")));
        assert!(files.iter().any(|(name, _)| name.contains("Part B")));
        for (_, data) in &files {
            assert_eq!(page_count(data), 2);
        }
    }

    #[tokio::test]
    async fn test_split_invalid_ranges_return_400() {
        let cases = [
            ("split,name,from,to\ny,Title,one,2", "non-integer"),
            ("split,name,from,to\ny,T1,0,1", "below 1"),
            ("split,name,from,to\ny,T2,3,2", "before start"),
            ("split,name,from,to\ny,T3,1,5", "exceeds total"),
            ("split,name,from,to\ny,A,,2", "non-integer"),
            ("split,name,from,to\ny,A,1,", "non-integer"),
            ("split,name,foo,to\ny,Name,1,2\n", "non-integer"),
        ];
        for (csv, expected) in cases {
            let response = split(csv).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let message = detail(&response).to_lowercase();
            assert!(message.contains(expected), "{:?} -> {:?}", csv, message);
        }
    }

    #[tokio::test]
    async fn test_split_empty_results() {
        for csv in [
            "split,name,from,to\nn,First,1,2\nn,Second,3,4\n",
            "",
            "split,name,from,to\n",
            "split,name,from,to\n,SkipMe,1,1\n",
            "split,name,from,to\n ,SkipMe,1,1\n",
            "split,name,from,to\nx,SkipMe,1,1\n",
            "split,name,from,to\n0,SkipMe,1,1\n",
        ] {
            let response = split(csv).await;
            response.assert_status_ok();
            assert!(fragments(&response).is_empty(), "{:?}", csv);
        }
    }

    #[tokio::test]
    async fn test_split_bom_header_yields_empty_archive() {
        let mut csv = b"\xef\xbb\xbf".to_vec();
        csv.extend_from_slice(b"split,name,from,to\ny,Segment,1,2\n");
        let response = split_raw(create_test_pdf(4), csv).await;
        response.assert_status_ok();
        assert!(fragments(&response).is_empty());
    }

    #[tokio::test]
    async fn test_split_extra_columns_ignored() {
        let response = split("foo,from,split,name,to,bar\nx,1,y,Title,1,2,z").await;
        response.assert_status_ok();
        let files = fragments(&response);
        assert_eq!(files.len(), 1);
        assert!(files[0].0.contains("Title"));
    }

    #[tokio::test]
    async fn test_split_case_insensitive_flag() {
        for flag in ["Y", "y"] {
            let response = split(&format!("split,name,from,to\n{},CaseTest,2,3\n", flag)).await;
            response.assert_status_ok();
            let files = fragments(&response);
            assert_eq!(files.len(), 1);
            assert_eq!(page_count(&files[0].1), 2);
        }
    }

    #[tokio::test]
    async fn test_split_filename_rules() {
        let response = split("split,name,from,to\ny,,2,3\n").await;
        let names: Vec<String> = fragments(&response).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["part_2_3.pdf".to_string()]);

        let response = split("split,name,from,to\ny,Bad:/Name*?,1,2\n").await;
        let names: Vec<String> = fragments(&response).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Bad__Name.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_split_overlapping_ranges() {
        let response = split("split,name,from,to\ny,First,1,3\ny,Second,2,4").await;
        response.assert_status_ok();
        let files = fragments(&response);
        assert_eq!(files.len(), 2);
        for (_, data) in &files {
            assert_eq!(page_count(data), 3);
        }
    }

    #[tokio::test]
    async fn test_split_non_utf8_csv() {
        let csv = b"split,name,from,to\ny,Part \xc1,1,2\n".to_vec();
        let response = split_raw(create_test_pdf(4), csv).await;
        response.assert_status_ok();
        let files = fragments(&response);
        assert_eq!(files.len(), 1);
        assert_eq!(page_count(&files[0].1), 2);
    }

    #[tokio::test]
    async fn test_split_bad_pdf_returns_400() {
        for bytes in [b"hello world".to_vec(), TRUNCATED_PDF.to_vec()] {
            let response = split_raw(bytes, b"split,name,from,to\ny,A,1,1\n".to_vec()).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert!(detail(&response).to_lowercase().contains("invalid pdf"));
        }

        let response = split_raw(encrypted_pdf(1), b"split,name,from,to\ny,A,1,1\n".to_vec()).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(detail(&response).to_lowercase().contains("password-protected"));
    }

    #[tokio::test]
    async fn test_split_missing_csv_field_returns_400() {
        let response = server()
            .post("/api/split")
            .multipart(MultipartForm::new().add_part("pdf", pdf_part(create_test_pdf(1))))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(detail(&response).contains("'csvfile'"));
    }

    #[tokio::test]
    async fn test_round_trip_exported_table_splits_cleanly() {
        let pdf = chapters_pdf();
        let exported = fragments(&export(pdf.clone()).await);
        let level_0 = String::from_utf8(exported[0].1.clone()).unwrap();

        // flag every exported row for splitting
        let table = level_0.replace("\"n\",", "\"y\",");
        let response = split_raw(pdf, table.into_bytes()).await;
        response.assert_status_ok();

        let files = fragments(&response);
        let summary: Vec<(String, usize)> = files
            .iter()
            .map(|(name, data)| (name.clone(), page_count(data)))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Chapter 1.pdf".to_string(), 2),
                ("Chapter 2.pdf".to_string(), 1),
            ]
        );
    }
}

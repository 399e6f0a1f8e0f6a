use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;

const SPECIES: [&str; 3] = ["Iris-setosa", "Iris-versicolor", "Iris-virginica"];
const CENTERS: [[f64; 4]; 3] = [
    [5.0, 3.4, 1.5, 0.2],
    [5.9, 2.8, 4.3, 1.3],
    [6.6, 3.0, 5.6, 2.0],
];

/// 150 measurement rows, 50 per species, in class order.
pub fn iris_rows() -> Vec<String> {
    let mut rows = Vec::with_capacity(150);
    for (class, center) in CENTERS.iter().enumerate() {
        for i in 0..50 {
            let jitter = |k: usize| ((i * (3 + k) + k) % 9) as f64 * 0.05 - 0.2;
            rows.push(format!(
                "{:.2},{:.2},{:.2},{:.2},{}",
                center[0] + jitter(0),
                center[1] + jitter(1),
                center[2] + jitter(2),
                center[3] + jitter(3) * 0.5,
                SPECIES[class]
            ));
        }
    }
    rows
}

/// Iris data shaped like the headerless download.
pub fn iris_raw_csv() -> String {
    let mut text = iris_rows().join("\n");
    text.push('\n');
    text
}

/// Iris data shaped like the table the collector persists.
pub fn iris_table_csv() -> String {
    format!(
        "sepal_length,sepal_width,petal_length,petal_width,species\n{}",
        iris_raw_csv()
    )
}

/// Monthly counts with trend and seasonality starting at 1949-01.
pub fn airline_series(months: usize) -> Vec<(String, u32)> {
    (0..months)
        .map(|i| {
            let year = 1949 + i / 12;
            let month = i % 12 + 1;
            let seasonal = [0, 6, 14, 11, 4, 16, 30, 30, 18, 3, -9, 1][i % 12];
            let value = 112 + 2 * i as i64 + seasonal;
            (format!("{year}-{month:02}"), value as u32)
        })
        .collect()
}

/// Airline data shaped like the raw download.
pub fn airline_raw_csv(months: usize) -> String {
    let mut text = String::from("Month,Passengers\n");
    for (month, value) in airline_series(months) {
        text.push_str(&format!("{month},{value}\n"));
    }
    text
}

/// Airline data shaped like the table the collector persists.
pub fn airline_table_csv(months: usize) -> String {
    let mut text = String::from("month,passengers\n");
    for (month, value) in airline_series(months) {
        text.push_str(&format!("{month}-01,{value}\n"));
    }
    text
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Serve `body` with 200 to every connection; returns the base URL.
pub fn serve_static(body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

/// Names of the regular files directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

use std::fmt;

/// Upper bound (exclusive) for numeric input treated as a US ZIP code.
const ZIP_LIMIT: i64 = 100_000;

/// A forecast request, as typed by the user and classified by [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Free-form place name. Anything not recognized as a zip or coordinate lands here.
    City { name: String },
    /// ZIP code, kept as the exact text the user typed.
    Zip { code: String },
    /// Signed decimal degrees; south latitudes and west longitudes are negative.
    Location { lat: f64, lon: f64 },
}

/// Variant tag of a [`Request`], used when a provider rejects a whole class of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    City,
    Zip,
    Location,
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::City => "City name",
            RequestKind::Zip => "Zip code",
            RequestKind::Location => "Lat,lon coordinate",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::City { .. } => RequestKind::City,
            Request::Zip { .. } => RequestKind::Zip,
            Request::Location { .. } => RequestKind::Location,
        }
    }

    /// Label echoed into reports and failure messages for this request.
    pub fn subject(&self) -> String {
        match self {
            Request::City { name } => name.clone(),
            Request::Zip { code } => code.clone(),
            Request::Location { lat, lon } => format!("({lat}, {lon})"),
        }
    }
}

/// Classify raw user text into a [`Request`].
///
/// Precedence is fixed: a pair of comma-separated numbers is a coordinate, then
/// a bare integer in `0..100_000` is a zip, then any other non-blank text is a
/// city. Blank input yields `None`, which callers report as a query error.
pub fn classify(text: &str) -> Option<Request> {
    let query = clean(text);

    let tokens: Vec<&str> = query
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    if let [lat, lon] = tokens.as_slice() {
        if let (Some(lat), Some(lon)) = (parse_degrees(lat), parse_degrees(lon)) {
            return Some(Request::Location { lat, lon });
        }
    }

    if let Ok(value) = query.parse::<i64>() {
        if (0..ZIP_LIMIT).contains(&value) {
            return Some(Request::Zip { code: query });
        }
    }

    if query.is_empty() {
        None
    } else {
        Some(Request::City { name: query })
    }
}

/// Trim and collapse interior runs of whitespace to a single space.
fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_degrees(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

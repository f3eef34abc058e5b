use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lukket sett av kjente eksportformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// `{ "summary": { "start_time", "duration", "distance", "heart_rate": {...} } }`
    Summary,
    /// `startTime`, `duration: "PT…S"`, `kiloCalories`, `heartRate: { avg, max }`
    Iso,
    /// `start_date_local`, `elapsed_time`, `average_heartrate`, ...
    Strava,
    /// Flate nøkler (`date`, `distance_km`, `avg_heart_rate`, epoch-ms start)
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
}

impl DistanceUnit {
    pub fn to_km(self, x: f64) -> f64 {
        match self {
            DistanceUnit::Meters => x / 1000.0,
            DistanceUnit::Kilometers => x,
        }
    }
}

/// Nøkkelstier per logisk felt, i prioritert rekkefølge.
/// En sti er punktum-separert (`heart_rate.average`).
#[derive(Debug)]
pub struct KeyTable {
    pub date: &'static [&'static str],
    pub duration: &'static [&'static str],
    pub distance: &'static [(&'static str, DistanceUnit)],
    pub avg_heart_rate: &'static [&'static str],
    pub max_heart_rate: &'static [&'static str],
    pub calories: &'static [&'static str],
}

static SUMMARY_KEYS: KeyTable = KeyTable {
    date: &["summary.start_time", "summary.startTime", "start_time"],
    duration: &["summary.duration", "summary.duration_seconds", "duration"],
    distance: &[
        ("summary.distance", DistanceUnit::Meters),
        ("summary.distance_km", DistanceUnit::Kilometers),
    ],
    avg_heart_rate: &[
        "summary.heart_rate.average",
        "summary.heartRate.avg",
        "heart_rate.average",
    ],
    max_heart_rate: &[
        "summary.heart_rate.maximum",
        "summary.heart_rate.max",
        "summary.heartRate.max",
    ],
    calories: &["summary.calories", "summary.kiloCalories", "calories"],
};

static ISO_KEYS: KeyTable = KeyTable {
    date: &["startTime", "start_time", "startTimeMillis", "start_time_ms"],
    duration: &["duration", "durationSeconds"],
    distance: &[
        ("distance", DistanceUnit::Meters),
        ("distanceKm", DistanceUnit::Kilometers),
    ],
    avg_heart_rate: &["heartRate.avg", "heartRate.average", "heart_rate.average"],
    max_heart_rate: &["heartRate.max", "heartRate.maximum", "heart_rate.maximum"],
    calories: &["kiloCalories", "calories"],
};

static STRAVA_KEYS: KeyTable = KeyTable {
    date: &["start_date_local", "start_date"],
    duration: &["elapsed_time", "moving_time"],
    distance: &[("distance", DistanceUnit::Meters)],
    avg_heart_rate: &["average_heartrate", "avg_heart_rate"],
    max_heart_rate: &["max_heartrate", "max_heart_rate"],
    calories: &["calories"],
};

static FLAT_KEYS: KeyTable = KeyTable {
    date: &[
        "date",
        "start_time",
        "startTime",
        "start_date_local",
        "start_date",
        "start_time_ms",
        "startTimeMillis",
        "timestamp",
    ],
    duration: &[
        "duration_seconds",
        "duration",
        "elapsed_time",
        "moving_time",
        "durationSeconds",
    ],
    distance: &[
        ("distance_km", DistanceUnit::Kilometers),
        ("distance_m", DistanceUnit::Meters),
        ("distance", DistanceUnit::Meters),
    ],
    avg_heart_rate: &[
        "heart_rate.average",
        "heartRate.avg",
        "avg_heart_rate",
        "average_heartrate",
        "avg_hr",
    ],
    max_heart_rate: &[
        "heart_rate.maximum",
        "heartRate.max",
        "max_heart_rate",
        "max_heartrate",
        "max_hr",
    ],
    calories: &["calories", "kiloCalories", "kcal"],
};

/// Fingeravtrykk, sjekkes i fast rekkefølge: første treff bestemmer varianten.
const FINGERPRINTS: &[(SchemaVariant, &[&str])] = &[
    (SchemaVariant::Summary, &["summary"]),
    (SchemaVariant::Iso, &["startTime", "kiloCalories", "heartRate"]),
    (SchemaVariant::Strava, &["start_date_local", "elapsed_time", "average_heartrate"]),
];

impl SchemaVariant {
    pub const ALL: [SchemaVariant; 4] = [
        SchemaVariant::Summary,
        SchemaVariant::Iso,
        SchemaVariant::Strava,
        SchemaVariant::Flat,
    ];

    pub fn keys(self) -> &'static KeyTable {
        match self {
            SchemaVariant::Summary => &SUMMARY_KEYS,
            SchemaVariant::Iso => &ISO_KEYS,
            SchemaVariant::Strava => &STRAVA_KEYS,
            SchemaVariant::Flat => &FLAT_KEYS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVariant::Summary => "summary",
            SchemaVariant::Iso => "iso",
            SchemaVariant::Strava => "strava",
            SchemaVariant::Flat => "flat",
        }
    }

    /// Auto-deteksjon. Faller tilbake til `Flat`.
    pub fn detect(payload: &Value) -> SchemaVariant {
        let Some(obj) = payload.as_object() else {
            return SchemaVariant::Flat;
        };
        for (variant, probes) in FINGERPRINTS {
            // "summary" må være et ikke-tomt objekt for å telle
            let hit = probes.iter().any(|k| match obj.get(*k) {
                Some(Value::Object(m)) => !m.is_empty(),
                Some(Value::Null) | None => false,
                Some(_) => true,
            });
            if hit {
                return *variant;
            }
        }
        SchemaVariant::Flat
    }
}

/// Slår opp en punktum-sti. `null` regnes som fraværende.
pub fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = payload;
    for part in path.split('.') {
        cur = cur.as_object()?.get(part)?;
    }
    if cur.is_null() { None } else { Some(cur) }
}

/// Første tilstedeværende, ikke-null verdi i prioritert rekkefølge.
pub fn resolve<'a>(payload: &'a Value, paths: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    paths
        .iter()
        .find_map(|p| lookup(payload, p).map(|v| (*p, v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_in_priority_order() {
        assert_eq!(
            SchemaVariant::detect(&json!({"summary": {"start_time": "x"}, "startTime": "y"})),
            SchemaVariant::Summary
        );
        assert_eq!(SchemaVariant::detect(&json!({"startTime": "y"})), SchemaVariant::Iso);
        assert_eq!(SchemaVariant::detect(&json!({"elapsed_time": 10})), SchemaVariant::Strava);
        assert_eq!(SchemaVariant::detect(&json!({"summary": {}, "date": "x"})), SchemaVariant::Flat);
        assert_eq!(SchemaVariant::detect(&json!([1, 2])), SchemaVariant::Flat);
    }

    #[test]
    fn resolve_takes_first_present_non_null() {
        let v = json!({"heart_rate": {"average": null}, "heartRate": {"avg": 131}, "avg_heart_rate": 99});
        let (path, val) = resolve(&v, FLAT_KEYS.avg_heart_rate).unwrap();
        assert_eq!(path, "heartRate.avg");
        assert_eq!(val, &json!(131));
    }

    #[test]
    fn lookup_stops_at_non_objects() {
        let v = json!({"heart_rate": 120});
        assert!(lookup(&v, "heart_rate.average").is_none());
    }
}

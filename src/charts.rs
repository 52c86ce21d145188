use serde_json::Value;
use yew::prelude::*;

use crate::api::CategoryTotal;

const CHART_COLORS: [&str; 6] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884d8", "#82ca9d",
];

#[derive(Clone, PartialEq, Debug)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct ChartData {
    pub title: Option<String>,
    pub kind: Option<String>,
    pub points: Vec<ChartPoint>,
}

impl ChartData {
    /// Reads a chart payload out of a message component or tool result.
    /// Older payloads nest `title`/`type`/`xAxisKey` under `series[0]`
    /// instead of the top level, so both shapes are accepted.
    pub fn from_value(raw: &Value) -> Self {
        let first_series = raw.get("series").and_then(|s| s.get(0));
        let lookup = |key: &str| -> Option<String> {
            raw.get(key)
                .and_then(Value::as_str)
                .or_else(|| first_series.and_then(|s| s.get(key)).and_then(Value::as_str))
                .map(String::from)
        };

        let title = lookup("title");
        let kind = lookup("type");
        let x_axis_key = lookup("xAxisKey").unwrap_or_else(|| "name".to_string());

        let points = raw
            .get("data")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let name = match row.get(&x_axis_key) {
                            Some(Value::String(s)) => s.clone(),
                            Some(Value::Number(n)) => n.to_string(),
                            _ => return None,
                        };
                        let value = row.get("value").and_then(Value::as_f64)?;
                        Some(ChartPoint { name, value })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title,
            kind,
            points,
        }
    }

    pub fn from_totals(kind: &str, title: &str, rows: &[CategoryTotal]) -> Self {
        Self {
            title: if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            },
            kind: Some(kind.to_string()),
            points: rows
                .iter()
                .map(|row| ChartPoint {
                    name: row.name.clone(),
                    value: row.value,
                })
                .collect(),
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct DynamicChartProps {
    pub data: ChartData,
}

#[function_component(DynamicChart)]
pub fn dynamic_chart(props: &DynamicChartProps) -> Html {
    if props.data.points.is_empty() {
        return html! {
            <div class="h-[120px] flex items-center justify-center text-muted-foreground text-sm">
                {"No data available"}
            </div>
        };
    }

    let body = match props.data.kind.as_deref() {
        Some("pie") | Some("donut") => donut_chart(&props.data.points),
        _ => bar_rows(&props.data.points),
    };

    html! {
        <div class="space-y-3">
            {
                if let Some(title) = &props.data.title {
                    html! { <h4 class="text-sm font-bold text-foreground">{ title.clone() }</h4> }
                } else {
                    html! {}
                }
            }
            { body }
        </div>
    }
}

fn donut_chart(points: &[ChartPoint]) -> Html {
    let total: f64 = points.iter().map(|p| p.value).sum();
    if total <= 0.0 {
        return html! { <p class="text-sm text-muted-foreground">{"No data available"}</p> };
    }

    let radius = 38.0;
    let circumference = 2.0 * std::f64::consts::PI * radius;
    let mut covered = 0.0;

    html! {
        <div class="flex items-center gap-6">
            <svg class="w-28 h-28 transform -rotate-90 shrink-0" viewBox="0 0 96 96">
                { for points.iter().enumerate().map(|(i, point)| {
                    let fraction = point.value / total;
                    let dash = fraction * circumference;
                    let offset = -(covered * circumference);
                    covered += fraction;
                    html! {
                        <circle
                            cx="48" cy="48" r={radius.to_string()}
                            fill="transparent"
                            stroke={CHART_COLORS[i % CHART_COLORS.len()]}
                            stroke-width="14"
                            stroke-dasharray={format!("{} {}", dash, circumference - dash)}
                            stroke-dashoffset={offset.to_string()}
                        />
                    }
                }) }
            </svg>
            <ul class="space-y-1 text-sm">
                { for points.iter().enumerate().map(|(i, point)| html! {
                    <li class="flex items-center gap-2">
                        <span class="w-2.5 h-2.5 rounded-full shrink-0" style={format!("background: {}", CHART_COLORS[i % CHART_COLORS.len()])}></span>
                        <span class="text-muted-foreground">{ point.name.clone() }</span>
                        <span class="font-semibold text-foreground ml-auto pl-4">{ format!("{:.2}", point.value) }</span>
                    </li>
                }) }
            </ul>
        </div>
    }
}

fn bar_rows(points: &[ChartPoint]) -> Html {
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    html! {
        <div class="space-y-2">
            { for points.iter().map(|point| {
                let percent = if max > 0.0 { (point.value / max * 100.0).round() as i64 } else { 0 };
                html! {
                    <div class="flex flex-col gap-1 text-sm">
                        <div class="flex items-center justify-between">
                            <span class="text-muted-foreground">{ point.name.clone() }</span>
                            <span class="font-semibold text-foreground">{ format!("{:.2}", point.value) }</span>
                        </div>
                        <div class="h-2 w-full bg-secondary rounded-full overflow-hidden">
                            <div class="h-full bg-[#0EA5E9]" style={format!("width: {}%", percent)}></div>
                        </div>
                    </div>
                }
            }) }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_fields_are_read() {
        let raw = serde_json::json!({
            "title": "Spending by Category",
            "type": "pie",
            "data": [
                {"name": "Food", "value": 120.0},
                {"name": "Transport", "value": 45.5}
            ]
        });
        let chart = ChartData::from_value(&raw);
        assert_eq!(chart.title.as_deref(), Some("Spending by Category"));
        assert_eq!(chart.kind.as_deref(), Some("pie"));
        assert_eq!(chart.points.len(), 2);
        assert_eq!(chart.points[1].value, 45.5);
    }

    #[test]
    fn legacy_series_shape_fills_missing_fields() {
        let raw = serde_json::json!({
            "series": [{"title": "Cashflow", "type": "bar", "xAxisKey": "month"}],
            "data": [
                {"month": "2024-01", "value": 300.0},
                {"month": "2024-02", "value": 150.0}
            ]
        });
        let chart = ChartData::from_value(&raw);
        assert_eq!(chart.title.as_deref(), Some("Cashflow"));
        assert_eq!(chart.kind.as_deref(), Some("bar"));
        assert_eq!(chart.points[0].name, "2024-01");
    }

    #[test]
    fn rows_without_value_or_name_are_dropped() {
        let raw = serde_json::json!({
            "type": "bar",
            "data": [
                {"name": "ok", "value": 1.0},
                {"name": "no value"},
                {"value": 2.0}
            ]
        });
        let chart = ChartData::from_value(&raw);
        assert_eq!(chart.points.len(), 1);
    }
}

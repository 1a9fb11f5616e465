//! Per-node GPU timing capture and the node-timings report format.
//!
//! Format (parser-stable): `Name[shader]=12.34ms | Other[shader]=n/a`,
//! entries separated by ` | `, missing timings spelled literally `n/a`.

use std::fmt::Write as _;

/// One node's recorded (or missing) GPU duration.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTiming {
    pub name: String,
    pub shader: String,
    /// `None` renders as `n/a` — e.g. a node skipped this frame, or a device
    /// that doesn't support timestamp queries.
    pub millis: Option<f32>,
}

/// An ordered collection of per-node timings for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTimings(pub Vec<NodeTiming>);

impl NodeTimings {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, shader: impl Into<String>, millis: Option<f32>) {
        self.0.push(NodeTiming {
            name: name.into(),
            shader: shader.into(),
            millis,
        });
    }

    /// Renders the `Name[shader]=Xms | Other[shader]=n/a` report string.
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = String::new();
        for (i, t) in self.0.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            match t.millis {
                Some(ms) => {
                    let _ = write!(out, "{}[{}]={ms:.2}ms", t.name, t.shader);
                }
                None => {
                    let _ = write!(out, "{}[{}]=n/a", t.name, t.shader);
                }
            }
        }
        out
    }

    /// Parses a previously-`format`ted report string back into entries.
    ///
    /// Returns `None` if any entry doesn't match `Name[shader]=value`.
    #[must_use]
    pub fn parse(report: &str) -> Option<Self> {
        if report.is_empty() {
            return Some(Self::new());
        }

        let mut entries = Vec::new();
        for part in report.split(" | ") {
            let open = part.find('[')?;
            let close = part.find(']')?;
            if close < open {
                return None;
            }
            let name = &part[..open];
            let shader = &part[open + 1..close];
            let rest = part.get(close + 1..)?;
            let value = rest.strip_prefix('=')?;

            let millis = if value == "n/a" {
                None
            } else {
                Some(value.strip_suffix("ms")?.parse::<f32>().ok()?)
            };

            entries.push(NodeTiming {
                name: name.to_string(),
                shader: shader.to_string(),
                millis,
            });
        }
        Some(Self(entries))
    }
}

/// GPU timestamp-query bookkeeping for one frame.
///
/// Each node gets a begin/end timestamp pair written into a `QuerySet`; after
/// the command buffer completes, the resolved buffer is mapped and read back
/// to produce a [`NodeTimings`] report. Capacity is fixed per frame
/// (`2 * node_count`).
pub struct TimestampQuerySet {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    capacity: u32,
    period_ns: f32,
}

impl TimestampQuerySet {
    #[must_use]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, node_count: u32) -> Self {
        let capacity = (node_count * 2).max(2);
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("lumagraph node timings"),
            ty: wgpu::QueryType::Timestamp,
            count: capacity,
        });

        let buffer_size = u64::from(capacity) * 8;
        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumagraph timestamp resolve"),
            size: buffer_size,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumagraph timestamp readback"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            query_set,
            resolve_buffer,
            readback_buffer,
            capacity,
            period_ns: queue.get_timestamp_period(),
        }
    }

    #[must_use]
    pub fn query_set(&self) -> &wgpu::QuerySet {
        &self.query_set
    }

    /// Queue indices for a node's begin/end timestamp writes.
    #[must_use]
    pub fn slot_for(&self, node_index: u32) -> (u32, u32) {
        let base = (node_index * 2).min(self.capacity.saturating_sub(2));
        (base, base + 1)
    }

    pub fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(&self.query_set, 0..self.capacity, &self.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(
            &self.resolve_buffer,
            0,
            &self.readback_buffer,
            0,
            u64::from(self.capacity) * 8,
        );
    }

    /// Converts a begin/end timestamp pair (raw GPU ticks) into milliseconds.
    #[must_use]
    pub fn ticks_to_millis(&self, begin: u64, end: u64) -> f32 {
        let ticks = end.saturating_sub(begin);
        (ticks as f32 * self.period_ns) / 1_000_000.0
    }

    #[must_use]
    pub fn readback_buffer(&self) -> &wgpu::Buffer {
        &self.readback_buffer
    }

    /// Blocks until the resolved timestamps are readable, then converts each
    /// node's begin/end tick pair into milliseconds. Returns one entry per
    /// node in dispatch order.
    #[must_use]
    pub fn read_millis(&self, device: &wgpu::Device, node_count: u32) -> Vec<Option<f32>> {
        let slice = self.readback_buffer.slice(..);
        let (tx, rx) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .expect("map_async callback channel dropped before firing")
            .expect("timestamp readback buffer mapping failed");

        let mapped = slice.get_mapped_range();
        let ticks: &[u64] = bytemuck::cast_slice(&mapped);

        let mut out = Vec::with_capacity(node_count as usize);
        for i in 0..node_count {
            let (begin, end) = self.slot_for(i);
            let (begin, end) = (begin as usize, end as usize);
            out.push(if end < ticks.len() {
                Some(self.ticks_to_millis(ticks[begin], ticks[end]))
            } else {
                None
            });
        }
        drop(mapped);
        self.readback_buffer.unmap();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_round_trips_through_parse() {
        let mut t = NodeTimings::new();
        t.push("Source", "source_linear_ramp", Some(1.5));
        t.push("Tonemap", "aces_tonemap", None);

        let report = t.format();
        assert_eq!(
            report,
            "Source[source_linear_ramp]=1.50ms | Tonemap[aces_tonemap]=n/a"
        );

        let parsed = NodeTimings::parse(&report).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn empty_timings_format_to_empty_string() {
        let t = NodeTimings::new();
        assert_eq!(t.format(), "");
        assert_eq!(NodeTimings::parse("").unwrap(), t);
    }

    #[test]
    fn parse_rejects_malformed_entries() {
        assert!(NodeTimings::parse("NoBrackets=1.0ms").is_none());
        assert!(NodeTimings::parse("Name[shader]badvalue").is_none());
    }
}

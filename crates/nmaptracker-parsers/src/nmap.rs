//! Streaming Nmap XML parser (spec.md §4.2).
//!
//! Uses a `quick_xml::Reader` pull-parsing loop that emits typed,
//! validated fields and invokes a per-host callback as soon as a
//! `</host>` closes, instead of buffering the whole document into one
//! `Vec`, so memory use is bounded by one host's worth of ports rather
//! than the whole document.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("missing required attribute `{attribute}` on <{element}>")]
    MissingAttribute { element: &'static str, attribute: &'static str },
}

/// Run-level metadata captured from the `<nmaprun>` root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunMetadata {
    /// The verbatim `args` attribute, trimmed. `None` if absent.
    pub nmap_args: Option<String>,
}

/// A single host as emitted by the streaming parser, before scope
/// classification or merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHostObservation {
    pub ip_address: String,
    pub hostname: Option<String>,
    pub os_guess: Option<String>,
    /// Lowercased `<status state="..."/>` value, e.g. "up" or "down".
    pub host_state: String,
    pub ports: Vec<RawPortObservation>,
}

/// A single port as emitted by the streaming parser. Only ports whose
/// `portid` parses as `1..=65535` are ever produced (spec.md §8 boundary:
/// port 0 and >65535 "are rejected by the parser" and never persisted).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPortObservation {
    pub port_number: u16,
    pub protocol: String,
    pub state: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub product: Option<String>,
    pub extra_info: Option<String>,
    /// Every `<script id="..." output="..."/>` rendered as `"id: output"`
    /// and joined with newlines, in document order.
    pub script_output: Option<String>,
}

#[derive(Default)]
struct HostBuilder {
    host_state: String,
    addresses: Vec<(String, String)>, // (addrtype, addr), document order
    hostnames: Vec<String>,
    os_matches: Vec<String>,
    ports: Vec<RawPortObservation>,
    current_port: Option<PortBuilder>,
}

#[derive(Default)]
struct PortBuilder {
    port_number_raw: Option<i64>,
    protocol: String,
    state: String,
    service: Option<String>,
    version: Option<String>,
    product: Option<String>,
    extra_info: Option<String>,
    script_lines: Vec<String>,
}

impl HostBuilder {
    fn finish(self) -> RawHostObservation {
        let ip_address = self
            .addresses
            .iter()
            .find(|(addrtype, _)| addrtype == "ipv4")
            .or_else(|| self.addresses.first())
            .map(|(_, addr)| addr.clone())
            .unwrap_or_default();

        RawHostObservation {
            ip_address,
            hostname: self.hostnames.into_iter().next(),
            os_guess: self.os_matches.into_iter().next(),
            host_state: self.host_state,
            ports: self.ports,
        }
    }
}

impl PortBuilder {
    /// Finalize the in-progress port. Returns `None` if the accumulated
    /// `portid` is out of the valid `1..=65535` range — such ports are
    /// silently dropped by the parser rather than persisted.
    fn finish(self) -> Option<RawPortObservation> {
        let port_number = self.port_number_raw?;
        if !(1..=65535).contains(&port_number) {
            return None;
        }
        let script_output =
            if self.script_lines.is_empty() { None } else { Some(self.script_lines.join("\n")) };
        Some(RawPortObservation {
            port_number: port_number as u16,
            protocol: self.protocol,
            state: self.state,
            service: self.service,
            version: self.version,
            product: self.product,
            extra_info: self.extra_info,
            script_output,
        })
    }
}

fn attr_value(e: &quick_xml::events::BytesStart, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).trim().to_string())
}

/// Stream-parse an Nmap XML document, invoking `on_host` once per completed
/// `<host>` element and returning the run-level metadata once EOF is
/// reached. Memory use beyond the current host's ports is O(1) in document
/// size: no host is retained after its callback returns.
///
/// `on_host` is only ever handed complete hosts, but callers that need the
/// run's `args` attribute before the first host arrives (intent resolution,
/// source-IP/port inference) can't wait for the return value — the root
/// `<nmaprun>` tag always precedes every `<host>` in document order, so
/// [`stream_hosts_with_metadata`] exposes it as soon as it's seen.
pub fn stream_hosts<R, F>(reader: R, on_host: F) -> Result<RunMetadata, ParseError>
where
    R: BufRead,
    F: FnMut(RawHostObservation),
{
    stream_hosts_with_metadata(reader, |_| {}, on_host)
}

/// Like [`stream_hosts`], but also invokes `on_run_metadata` the moment the
/// `<nmaprun>` element's attributes are read, before any host is processed.
pub fn stream_hosts_with_metadata<R, M, F>(
    reader: R,
    mut on_run_metadata: M,
    mut on_host: F,
) -> Result<RunMetadata, ParseError>
where
    R: BufRead,
    M: FnMut(&RunMetadata),
    F: FnMut(RawHostObservation),
{
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut run_metadata = RunMetadata::default();
    let mut current_host: Option<HostBuilder> = None;
    let mut in_host = false;
    let mut buf = Vec::new();
    let mut host_count = 0u64;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "nmaprun" => {
                        run_metadata.nmap_args = attr_value(e, "args").filter(|s| !s.is_empty());
                        on_run_metadata(&run_metadata);
                    }
                    "host" => {
                        in_host = true;
                        current_host = Some(HostBuilder { host_state: "unknown".to_string(), ..Default::default() });
                    }
                    "status" if in_host => {
                        let state = attr_value(e, "state")
                            .ok_or(ParseError::MissingAttribute { element: "status", attribute: "state" })?;
                        if let Some(host) = current_host.as_mut() {
                            host.host_state = state.to_lowercase();
                        }
                    }
                    "address" if in_host => {
                        let addr = attr_value(e, "addr")
                            .ok_or(ParseError::MissingAttribute { element: "address", attribute: "addr" })?;
                        let addrtype = attr_value(e, "addrtype")
                            .ok_or(ParseError::MissingAttribute { element: "address", attribute: "addrtype" })?;
                        if let Some(host) = current_host.as_mut() {
                            host.addresses.push((addrtype, addr));
                        }
                    }
                    "hostname" if in_host => {
                        if let Some(name) = attr_value(e, "name") {
                            if let Some(host) = current_host.as_mut() {
                                host.hostnames.push(name);
                            }
                        }
                    }
                    "osmatch" if in_host => {
                        if let Some(name) = attr_value(e, "name") {
                            if let Some(host) = current_host.as_mut() {
                                host.os_matches.push(name);
                            }
                        }
                    }
                    "port" if in_host => {
                        let protocol = attr_value(e, "protocol")
                            .ok_or(ParseError::MissingAttribute { element: "port", attribute: "protocol" })?;
                        let portid = attr_value(e, "portid")
                            .ok_or(ParseError::MissingAttribute { element: "port", attribute: "portid" })?;
                        if let Some(host) = current_host.as_mut() {
                            host.current_port = Some(PortBuilder {
                                port_number_raw: portid.parse::<i64>().ok(),
                                protocol: protocol.to_lowercase(),
                                state: "unknown".to_string(),
                                ..Default::default()
                            });
                        }
                    }
                    "state" if in_host => {
                        if let Some(state) = attr_value(e, "state") {
                            if let Some(port) = current_host.as_mut().and_then(|h| h.current_port.as_mut()) {
                                port.state = state.to_lowercase();
                            }
                        }
                    }
                    "service" if in_host => {
                        if let Some(port) = current_host.as_mut().and_then(|h| h.current_port.as_mut()) {
                            port.service = attr_value(e, "name");
                            port.version = attr_value(e, "version");
                            port.product = attr_value(e, "product");
                            port.extra_info = attr_value(e, "extrainfo");
                        }
                    }
                    "script" if in_host => {
                        if let Some(port) = current_host.as_mut().and_then(|h| h.current_port.as_mut()) {
                            let id = attr_value(e, "id").unwrap_or_default();
                            let output = attr_value(e, "output").unwrap_or_default();
                            port.script_lines.push(format!("{id}: {output}"));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "port" => {
                        if let Some(host) = current_host.as_mut() {
                            if let Some(port) = host.current_port.take() {
                                if let Some(finished) = port.finish() {
                                    host.ports.push(finished);
                                }
                            }
                        }
                    }
                    "host" => {
                        if let Some(host) = current_host.take() {
                            host_count += 1;
                            on_host(host.finish());
                        }
                        in_host = false;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(error = %e, "nmap XML document failed to parse");
                return Err(ParseError::Xml(e.to_string()));
            }
            _ => {}
        }
        buf.clear();
    }

    tracing::debug!(host_count, args = ?run_metadata.nmap_args, "finished streaming nmap XML document");
    Ok(run_metadata)
}

/// Buffered convenience wrapper over [`stream_hosts`] for tests and small
/// fixtures: collects every host into a `Vec` rather than streaming.
pub fn parse_all<R: BufRead>(reader: R) -> Result<(RunMetadata, Vec<RawHostObservation>), ParseError> {
    let mut hosts = Vec::new();
    let metadata = stream_hosts(reader, |host| hosts.push(host))?;
    Ok((metadata, hosts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<(RunMetadata, Vec<RawHostObservation>), ParseError> {
        parse_all(xml.as_bytes())
    }

    #[test]
    fn test_parse_empty_run() {
        let (meta, hosts) = parse(r#"<?xml version="1.0"?><nmaprun args="nmap -sn 10.0.0.0/24"></nmaprun>"#).unwrap();
        assert!(hosts.is_empty());
        assert_eq!(meta.nmap_args.as_deref(), Some("nmap -sn 10.0.0.0/24"));
    }

    #[test]
    fn test_parse_single_host_single_port() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun args="nmap 10.0.0.1">
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="22">
        <state state="open"/>
        <service name="ssh"/>
      </port>
    </ports>
  </host>
</nmaprun>"#;
        let (meta, hosts) = parse(xml).unwrap();
        assert_eq!(meta.nmap_args.as_deref(), Some("nmap 10.0.0.1"));
        assert_eq!(hosts.len(), 1);
        let host = &hosts[0];
        assert_eq!(host.ip_address, "10.0.0.1");
        assert_eq!(host.host_state, "up");
        assert_eq!(host.ports.len(), 1);
        assert_eq!(host.ports[0].port_number, 22);
        assert_eq!(host.ports[0].state, "open");
        assert_eq!(host.ports[0].service.as_deref(), Some("ssh"));
    }

    #[test]
    fn test_ipv4_preferred_over_mac() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun>
  <host>
    <status state="up"/>
    <address addr="AA:BB:CC:DD:EE:FF" addrtype="mac"/>
    <address addr="10.0.0.9" addrtype="ipv4"/>
  </host>
</nmaprun>"#;
        let (_, hosts) = parse(xml).unwrap();
        assert_eq!(hosts[0].ip_address, "10.0.0.9");
    }

    #[test]
    fn test_first_address_wins_when_no_ipv4() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun>
  <host>
    <status state="up"/>
    <address addr="fe80::1" addrtype="ipv6"/>
  </host>
</nmaprun>"#;
        let (_, hosts) = parse(xml).unwrap();
        assert_eq!(hosts[0].ip_address, "fe80::1");
    }

    #[test]
    fn test_hostname_and_os_guess_take_first() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun>
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <hostnames>
      <hostname name="first.local" type="PTR"/>
      <hostname name="second.local" type="user"/>
    </hostnames>
    <os>
      <osmatch name="Linux 5.X"/>
      <osmatch name="Linux 4.X"/>
    </os>
  </host>
</nmaprun>"#;
        let (_, hosts) = parse(xml).unwrap();
        assert_eq!(hosts[0].hostname.as_deref(), Some("first.local"));
        assert_eq!(hosts[0].os_guess.as_deref(), Some("Linux 5.X"));
    }

    #[test]
    fn test_script_output_concatenation() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun>
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="443">
        <state state="open"/>
        <script id="ssl-cert" output="CN=example.com"/>
        <script id="vulners" output="CVE-2021-1234"/>
      </port>
    </ports>
  </host>
</nmaprun>"#;
        let (_, hosts) = parse(xml).unwrap();
        assert_eq!(
            hosts[0].ports[0].script_output.as_deref(),
            Some("ssl-cert: CN=example.com\nvulners: CVE-2021-1234")
        );
    }

    #[test]
    fn test_port_zero_and_over_65535_rejected() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun>
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="0"><state state="open"/></port>
      <port protocol="tcp" portid="70000"><state state="open"/></port>
      <port protocol="tcp" portid="80"><state state="open"/></port>
    </ports>
  </host>
</nmaprun>"#;
        let (_, hosts) = parse(xml).unwrap();
        assert_eq!(hosts[0].ports.len(), 1);
        assert_eq!(hosts[0].ports[0].port_number, 80);
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let result = parse("<nmaprun><host></nmaprun>");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_status_state_is_parse_error() {
        let xml = r#"<nmaprun><host><status/></host></nmaprun>"#;
        assert!(parse(xml).is_err());
    }

    #[test]
    fn test_missing_port_attribute_is_parse_error() {
        let xml = r#"<nmaprun><host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/><ports><port protocol="tcp"><state state="open"/></port></ports></host></nmaprun>"#;
        assert!(parse(xml).is_err());
    }

    #[test]
    fn test_multiple_hosts_streamed_independently() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun>
  <host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
  <host><status state="down"/><address addr="10.0.0.2" addrtype="ipv4"/></host>
</nmaprun>"#;
        let (_, hosts) = parse(xml).unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].host_state, "up");
        assert_eq!(hosts[1].host_state, "down");
    }

    #[test]
    fn test_stream_hosts_invokes_callback_and_drops_state() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun>
  <host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
  <host><status state="up"/><address addr="10.0.0.2" addrtype="ipv4"/></host>
</nmaprun>"#;
        let mut seen = Vec::new();
        let meta = stream_hosts(xml.as_bytes(), |h| seen.push(h.ip_address)).unwrap();
        assert_eq!(seen, vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]);
        assert!(meta.nmap_args.is_none());
    }

    #[test]
    fn test_run_metadata_callback_fires_before_first_host() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun args="nmap -sS -p22 10.0.0.1">
  <host><status state="up"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
</nmaprun>"#;
        let mut args_seen_before_host = None;
        let mut hosts_seen_at_callback_time = 0;
        stream_hosts_with_metadata(
            xml.as_bytes(),
            |meta| args_seen_before_host = meta.nmap_args.clone(),
            |_| hosts_seen_at_callback_time += 1,
        )
        .unwrap();
        assert_eq!(args_seen_before_host.as_deref(), Some("nmap -sS -p22 10.0.0.1"));
        assert_eq!(hosts_seen_at_callback_time, 1);
    }
}

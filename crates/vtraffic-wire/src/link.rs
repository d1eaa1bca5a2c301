use vtraffic_core::LatLon;

/// Prefix of every position message on the link channel.
///
/// A message is `Qs121=pitch;bank;heading;alt;tas;lat;lon` with latitude and
/// longitude in radians. The stream is unframed; the next message or any
/// other byte ends the longitude.
pub const LINK_MARKER: &str = "Qs121=";

/// Index of the longitude among the fields after the marker.
const LONGITUDE_FIELD: usize = 6;

/// Outcome of scanning the pending link text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkScan {
    /// A position; drop `consumed` leading bytes before scanning again.
    Position { position: LatLon, consumed: usize },
    /// A message that cannot be read; drop `consumed` leading bytes.
    Malformed { consumed: usize },
    /// A message is still arriving; the `discard` bytes before it are noise.
    Incomplete { discard: usize },
    NotFound,
}

/// Scans streamed text for the first position message.
///
/// A longitude that runs to the end of `buffer` may still be arriving, so it
/// is reported as incomplete.
#[must_use]
pub fn scan_link_buffer(buffer: &str) -> LinkScan {
    scan(buffer, false)
}

/// Reads the first position message of a complete text, returning it with the
/// length of the text it spans (leading noise included).
#[must_use]
pub fn parse_link_position(buffer: &str) -> Option<(LatLon, usize)> {
    match scan(buffer, true) {
        LinkScan::Position { position, consumed } => Some((position, consumed)),
        _ => None,
    }
}

fn scan(buffer: &str, complete: bool) -> LinkScan {
    let Some(start) = buffer.find(LINK_MARKER) else {
        return LinkScan::NotFound;
    };
    let body_start = start + LINK_MARKER.len();
    let body = &buffer[body_start..];

    let mut field_starts = vec![0];
    for (index, character) in body.char_indices() {
        if field_starts.len() > LONGITUDE_FIELD {
            break;
        }
        if character == ';' || character == '=' {
            field_starts.push(index + 1);
        }
    }

    let head_end = field_starts.last().copied().unwrap_or(0);
    // A marker among the fields means this message was cut off.
    if let Some(next) = body[..head_end].find(LINK_MARKER) {
        return LinkScan::Malformed {
            consumed: body_start + next,
        };
    }
    if field_starts.len() <= LONGITUDE_FIELD {
        return LinkScan::Incomplete { discard: start };
    }

    let longitude_start = field_starts[LONGITUDE_FIELD];
    let latitude_text = &body[field_starts[LONGITUDE_FIELD - 1]..longitude_start - 1];
    let longitude_tail = &body[longitude_start..];
    let longitude_len = longitude_tail
        .find(|character: char| !is_number_character(character))
        .unwrap_or(longitude_tail.len());
    if longitude_len == longitude_tail.len() && !complete {
        return LinkScan::Incomplete { discard: start };
    }

    let consumed = body_start + longitude_start + longitude_len;
    let latitude = latitude_text.trim().parse::<f64>();
    let longitude = longitude_tail[..longitude_len].parse::<f64>();
    match (latitude, longitude) {
        (Ok(latitude), Ok(longitude)) => match LatLon::from_radians(latitude, longitude) {
            Ok(position) => LinkScan::Position { position, consumed },
            Err(_) => LinkScan::Malformed { consumed },
        },
        _ => LinkScan::Malformed { consumed },
    }
}

fn is_number_character(character: char) -> bool {
    character.is_ascii_digit() || matches!(character, '.' | '-' | '+')
}

#[cfg(test)]
mod tests {
    use super::{parse_link_position, scan_link_buffer, LinkScan};

    const MESSAGE: &str =
        "Qs121=6747;289;5.449771266137578;37988724;501908;0.6564195830703577;-2.1443275933742236";

    fn approx_equal(left: f64, right: f64, tolerance: f64) {
        assert!(
            (left - right).abs() <= tolerance,
            "left={left} right={right} tolerance={tolerance}"
        );
    }

    #[test]
    fn reads_radians_and_stops_at_the_longitude() {
        let buffer = format!("garbage{MESSAGE}tail");
        let (position, consumed) = parse_link_position(&buffer).expect("position found");

        approx_equal(position.latitude(), 0.6564195830703577_f64.to_degrees(), 1e-12);
        approx_equal(
            position.longitude(),
            (-2.1443275933742236_f64).to_degrees(),
            1e-12,
        );
        approx_equal(position.latitude(), 37.610, 0.01);
        assert_eq!(&buffer[consumed..], "tail");
    }

    #[test]
    fn trailing_longitude_waits_for_more_text_when_streaming() {
        let buffer = format!("noise{MESSAGE}");
        assert_eq!(
            scan_link_buffer(&buffer),
            LinkScan::Incomplete { discard: 5 }
        );
        assert!(parse_link_position(&buffer).is_some());
    }

    #[test]
    fn short_message_is_incomplete() {
        assert_eq!(
            scan_link_buffer("xxQs121=6747;289;5.44"),
            LinkScan::Incomplete { discard: 2 }
        );
        assert_eq!(scan_link_buffer("no marker here"), LinkScan::NotFound);
    }

    #[test]
    fn cut_off_message_is_skipped_up_to_the_next_marker() {
        let buffer = format!("Qs121=6747;289;5.4{MESSAGE}Q");
        let LinkScan::Malformed { consumed } = scan_link_buffer(&buffer) else {
            panic!("expected a malformed scan");
        };
        assert!(buffer[consumed..].starts_with("Qs121=6747;289;5.449"));

        let rest = &buffer[consumed..];
        assert!(matches!(
            scan_link_buffer(rest),
            LinkScan::Position { consumed, .. } if &rest[consumed..] == "Q"
        ));
    }

    #[test]
    fn non_numeric_coordinates_are_malformed() {
        let scan = scan_link_buffer("Qs121=1;2;3;4;5;north;-2.14;");
        assert_eq!(scan, LinkScan::Malformed { consumed: 27 });
    }
}

use nom::branch::alt;
use nom::bytes::complete::escaped;
use nom::bytes::complete::tag;
use nom::bytes::complete::take_while1;
use nom::character::complete::multispace0;
use nom::character::complete::none_of;
use nom::combinator::all_consuming;
use nom::error::ParseError;
use nom::multi::separated_list0;
use nom::sequence::delimited;
use nom::sequence::separated_pair;
use nom::IResult;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::Error;

/// Device and stream arguments, parsed from `key=value` pairs separated by commas.
///
/// Values may be quoted with `'` or `"` to contain commas, `=` or whitespace.
#[derive(Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Args {
    pairs: BTreeMap<String, String>,
}

impl Args {
    pub fn new() -> Self {
        Self {
            pairs: BTreeMap::new(),
        }
    }
    /// Parse the value stored for `key`.
    ///
    /// Returns [`Error::NotFound`] if the key is missing and [`Error::ValueError`] if the value
    /// does not parse as `V`.
    pub fn get<V: FromStr>(&self, key: impl AsRef<str>) -> Result<V, Error> {
        self.pairs
            .get(key.as_ref())
            .ok_or(Error::NotFound)
            .and_then(|v| v.parse().or(Err(Error::ValueError)))
    }
    /// Like [`get`](Args::get), but a missing key yields `None` instead of an error.
    pub fn get_opt<V: FromStr>(&self, key: impl AsRef<str>) -> Result<Option<V>, Error> {
        match self.get(key) {
            Ok(v) => Ok(Some(v)),
            Err(Error::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> Option<String> {
        self.pairs.insert(key.into(), value.into())
    }
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, String> {
        self.pairs.iter()
    }
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
    /// Deserialize the arguments into a typed configuration.
    ///
    /// All values are strings, so numeric fields of `D` need a `DisplayFromStr` adapter.
    pub fn deserialize<D: for<'a> Deserialize<'a>>(&self) -> Result<D, Error> {
        let v = serde_json::to_value(self).or(Err(Error::ValueError))?;
        serde_json::from_value(v).map_err(|e| {
            log::warn!("invalid arguments {self}: {e}");
            Error::ValueError
        })
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.pairs.fmt(f)
    }
}

impl std::fmt::Display for Args {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                write!(fmt, ", ")?;
            }
            first = false;
            if v.is_empty() || v.contains(|c: char| c == ',' || c == '=' || c.is_whitespace()) {
                write!(fmt, "{k}='{v}'")?;
            } else {
                write!(fmt, "{k}={v}")?;
            }
        }
        Ok(())
    }
}

fn token<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    let single = alt((escaped(none_of("\\\'"), '\\', tag("'")), tag("")));
    let double = alt((escaped(none_of("\\\""), '\\', tag("\"")), tag("")));
    let bare = |c: char| c != ',' && c != '=' && !c.is_whitespace();

    delimited(
        multispace0,
        alt((
            delimited(tag("'"), single, tag("'")),
            delimited(tag("\""), double, tag("\"")),
            take_while1(bare),
        )),
        multispace0,
    )(input)
}

type Pairs<'a> = Vec<(&'a str, &'a str)>;

fn pairs<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Pairs<'a>, E> {
    all_consuming(delimited(
        multispace0,
        separated_list0(tag(","), separated_pair(token, tag("="), token)),
        multispace0,
    ))(input)
}

impl FromStr for Args {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, v) = pairs::<nom::error::Error<_>>(s).or(Err(Error::ValueError))?;
        Ok(Args {
            pairs: v
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}

impl TryFrom<&str> for Args {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Args {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&String> for Args {
    type Error = Error;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<&Args> for Args {
    fn from(value: &Args) -> Self {
        value.clone()
    }
}

impl From<()> for Args {
    fn from(_value: ()) -> Self {
        Args::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty() {
        let a: Args = "".parse().unwrap();
        assert!(a.is_empty());
        let a: Args = "   ".parse().unwrap();
        assert!(a.is_empty());
    }
    #[test]
    fn parse_selector() {
        let a: Args = "bladerf=0".parse().unwrap();
        assert_eq!(a.get::<u32>("bladerf").unwrap(), 0);
        assert_eq!(a.len(), 1);
    }
    #[test]
    fn parse_whitespace() {
        let a: Args = "  bladerf = 1 ,   sampling=external  ".parse().unwrap();
        assert_eq!(a.get::<String>("bladerf").unwrap(), "1");
        assert_eq!(a.get::<String>("sampling").unwrap(), "external");
        assert_eq!(a.len(), 2);
    }
    #[test]
    fn parse_quoted() {
        let a: Args = "label='Nuand bladeRF, SN 1234', id=\"a=b\"".parse().unwrap();
        assert_eq!(a.get::<String>("label").unwrap(), "Nuand bladeRF, SN 1234");
        assert_eq!(a.get::<String>("id").unwrap(), "a=b");
    }
    #[test]
    fn parse_garbage() {
        assert_eq!("bladerf".parse::<Args>(), Err(Error::ValueError));
        assert_eq!("a=1,,b=2".parse::<Args>(), Err(Error::ValueError));
    }
    #[test]
    fn typed_get() {
        let a: Args = "stream_timeout=500,sampling=internal".parse().unwrap();
        assert_eq!(a.get::<u32>("stream_timeout").unwrap(), 500);
        assert_eq!(a.get::<u32>("sampling"), Err(Error::ValueError));
        assert_eq!(a.get::<u32>("buffers"), Err(Error::NotFound));
        assert_eq!(a.get_opt::<u32>("buffers"), Ok(None));
        assert_eq!(a.get_opt::<u32>("stream_timeout"), Ok(Some(500)));
    }
    #[test]
    fn display_roundtrip_sorted() {
        let a: Args = "serial=abc, label='x y', bladerf=0".parse().unwrap();
        assert_eq!(a.to_string(), "bladerf=0, label='x y', serial=abc");
        let b: Args = a.to_string().parse().unwrap();
        assert_eq!(a, b);
    }
    #[test]
    fn serde() {
        use serde::Deserialize;
        use serde_with::serde_as;
        use serde_with::DisplayFromStr;

        #[serde_as]
        #[derive(Deserialize)]
        struct Foo {
            #[serde_as(as = "DisplayFromStr")]
            buffers: u32,
        }

        let a: Args = "buffers=64,sampling=internal".parse().unwrap();
        let f: Foo = a.deserialize().unwrap();
        assert_eq!(f.buffers, 64);
    }
}

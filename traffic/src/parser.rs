use crate::codec::{decode, WireRecord};
use crate::error::Error;
use crate::models::Reading;
use crate::{Rank, MESSAGE_TYPE_HELLO, MESSAGE_TYPE_SHARE_RECORDS, MESSAGE_TYPE_SHARE_SIZE, RECORD_SIZE};
use nom::{
    bytes::streaming::{tag, take},
    combinator::{map, map_res},
    multi::count,
    number::streaming::be_u32,
    sequence::preceded,
    IResult,
};

/// `Ok(None)` means the buffer does not hold a whole message yet.
pub(crate) type Parsed<T> = Result<Option<(T, usize)>, Error>;

fn nom_record(input: &[u8]) -> IResult<&[u8], Reading> {
    map(map_res(take(RECORD_SIZE), |bytes: &[u8]| WireRecord::try_from(bytes)), |record| decode(&record))(input)
}

fn nom_hello(input: &[u8]) -> IResult<&[u8], Rank> {
    preceded(tag(&[MESSAGE_TYPE_HELLO][..]), be_u32)(input)
}

fn nom_share_size(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(tag(&[MESSAGE_TYPE_SHARE_SIZE][..]), be_u32)(input)
}

fn nom_share_records(input: &[u8], records: usize) -> IResult<&[u8], Vec<Reading>> {
    preceded(tag(&[MESSAGE_TYPE_SHARE_RECORDS][..]), count(nom_record, records))(input)
}

fn finish<T>(input: &[u8], result: IResult<&[u8], T>) -> Parsed<T> {
    match result {
        Ok((remainder, message)) => Ok(Some((message, input.len() - remainder.len()))),
        Err(err) => match err {
            nom::Err::Incomplete(_) => Ok(None),
            _ => Err(Error::InvalidData),
        },
    }
}

pub(crate) fn hello(input: &[u8]) -> Parsed<Rank> {
    finish(input, nom_hello(input))
}

pub(crate) fn share_size(input: &[u8]) -> Parsed<u32> {
    finish(input, nom_share_size(input))
}

/// Parses the payload that follows a size message promising `records`
/// readings. The payload carries no length of its own.
pub(crate) fn share_records(input: &[u8], records: usize) -> Parsed<Vec<Reading>> {
    if let Some(&message_type) = input.first() {
        if message_type != MESSAGE_TYPE_SHARE_RECORDS {
            return Err(Error::InvalidData);
        }
    }
    // Skip re-parsing a partially received share on every read.
    if input.len() < records.saturating_mul(RECORD_SIZE).saturating_add(1) {
        return Ok(None);
    }
    finish(input, nom_share_records(input, records))
}

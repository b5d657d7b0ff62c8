use crate::channel::Share;
use crate::error::Error;
use crate::models::Reading;

/// Share sizes for `records` readings over `workers` workers: the first
/// `records % workers` workers take one reading more than the rest.
pub fn share_sizes(records: usize, workers: usize) -> Result<Vec<usize>, Error> {
    if workers == 0 {
        return Err(Error::NoWorkers);
    }
    let base = records / workers;
    let extra = records % workers;
    Ok((0..workers).map(|index| if index < extra { base + 1 } else { base }).collect())
}

/// Splits the readings into contiguous shares, one per worker, in order.
/// Nothing groups readings by timestamp or sensor, so one sensor's readings
/// routinely land in several shares.
pub fn partition(readings: Vec<Reading>, workers: usize) -> Result<Vec<Share>, Error> {
    let sizes = share_sizes(readings.len(), workers)?;
    let mut remaining = readings.into_iter();
    Ok(sizes
        .into_iter()
        .map(|size| Share::new(remaining.by_ref().take(size).collect()))
        .collect())
}

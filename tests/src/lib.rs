#[cfg(test)]
mod end_to_end;
#[cfg(test)]
mod util;

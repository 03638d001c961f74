//! The user's current selection and the generation counters that guard it.

/// Aquifer, variable and well the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub aquifer_id: String,
    pub variable_id: String,
    /// Set by a well click, cleared when the aquifer changes.
    pub well_id: Option<String>,
}

impl Selection {
    pub fn has_aquifer(&self) -> bool {
        !self.aquifer_id.is_empty()
    }

    pub fn has_variable(&self) -> bool {
        !self.variable_id.is_empty()
    }
}

/// Token carried by a request and compared again when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

/// Monotonic counter for one logical request stream.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    counter: u64,
}

impl RequestGeneration {
    /// Invalidates every outstanding token and returns a fresh one.
    pub fn advance(&mut self) -> Generation {
        self.counter += 1;
        Generation(self.counter)
    }

    pub fn current(&self) -> Generation {
        Generation(self.counter)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.counter
    }
}

/// Request streams that carry their own generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Boundary,
    Wells,
    TimeSeries,
    Catalog,
}

impl Stream {
    pub fn label(&self) -> &'static str {
        match self {
            Stream::Boundary => "boundary",
            Stream::Wells => "wells",
            Stream::TimeSeries => "time series",
            Stream::Catalog => "catalog",
        }
    }
}

/// One counter per stream.
#[derive(Debug, Clone, Default)]
pub struct StreamGenerations {
    boundary: RequestGeneration,
    wells: RequestGeneration,
    time_series: RequestGeneration,
    catalog: RequestGeneration,
}

impl StreamGenerations {
    fn counter(&self, stream: Stream) -> &RequestGeneration {
        match stream {
            Stream::Boundary => &self.boundary,
            Stream::Wells => &self.wells,
            Stream::TimeSeries => &self.time_series,
            Stream::Catalog => &self.catalog,
        }
    }

    pub fn advance(&mut self, stream: Stream) -> Generation {
        let counter = match stream {
            Stream::Boundary => &mut self.boundary,
            Stream::Wells => &mut self.wells,
            Stream::TimeSeries => &mut self.time_series,
            Stream::Catalog => &mut self.catalog,
        };
        counter.advance()
    }

    pub fn current(&self, stream: Stream) -> Generation {
        self.counter(stream).current()
    }

    pub fn is_current(&self, stream: Stream, generation: Generation) -> bool {
        self.counter(stream).is_current(generation)
    }
}

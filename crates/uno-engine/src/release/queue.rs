use std::collections::VecDeque;

/// Frame-delayed release lists.
///
/// Items deferred during frame `i` are handed to the release callback by the
/// `end_frame` call of frame `i + latency`. With `latency == 0` that is the end
/// of the same frame, after its commands were submitted.
///
/// Lists are recycled, so steady-state frames do not allocate.
#[derive(Debug)]
pub struct ReleaseQueue<T> {
    latency: usize,
    /// Oldest list first; the back list collects the current frame.
    lists: VecDeque<Vec<T>>,
    spare: Vec<Vec<T>>,
}

impl<T> ReleaseQueue<T> {
    pub fn new(latency: usize) -> Self {
        let mut lists = VecDeque::with_capacity(latency + 1);
        lists.push_back(Vec::new());
        Self { latency, lists, spare: Vec::new() }
    }

    #[inline]
    pub fn latency(&self) -> usize {
        self.latency
    }

    /// Queues `item` for release with the current frame.
    pub fn defer(&mut self, item: T) {
        match self.lists.back_mut() {
            Some(list) => list.push(item),
            None => self.lists.push_back(vec![item]),
        }
    }

    /// Closes the current frame's list and releases the list that has waited
    /// `latency` frames. Returns the number of released items.
    pub fn end_frame(&mut self, mut release: impl FnMut(T)) -> usize {
        let mut released = 0;
        if self.lists.len() > self.latency {
            if let Some(mut ready) = self.lists.pop_front() {
                released = ready.len();
                ready.drain(..).for_each(&mut release);
                self.spare.push(ready);
            }
        }
        let next = self.spare.pop().unwrap_or_default();
        self.lists.push_back(next);
        released
    }

    /// Releases every queued item regardless of latency.
    pub fn drain_all(&mut self, mut release: impl FnMut(T)) -> usize {
        let mut released = 0;
        for list in self.lists.iter_mut() {
            released += list.len();
            list.drain(..).for_each(&mut release);
        }
        released
    }

    /// Items waiting for release, across all frames.
    pub fn pending(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Iterates waiting items, oldest frame first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.lists.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(queue: &mut ReleaseQueue<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        queue.end_frame(|x| out.push(x));
        out
    }

    #[test]
    fn zero_latency_releases_at_end_of_same_frame() {
        let mut queue = ReleaseQueue::new(0);
        queue.defer(1);
        queue.defer(2);
        assert_eq!(queue.pending(), 2);

        assert_eq!(collect(&mut queue), vec![1, 2]);
        assert!(queue.is_empty());
        assert!(collect(&mut queue).is_empty());
    }

    #[test]
    fn latency_delays_release_by_whole_frames() {
        let mut queue = ReleaseQueue::new(2);

        queue.defer(10); // frame 0
        assert!(collect(&mut queue).is_empty());

        queue.defer(11); // frame 1
        assert!(collect(&mut queue).is_empty());

        assert_eq!(collect(&mut queue), vec![10]); // frame 2
        assert_eq!(collect(&mut queue), vec![11]); // frame 3
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_all_ignores_latency() {
        let mut queue = ReleaseQueue::new(3);
        queue.defer(1);
        collect(&mut queue);
        queue.defer(2);

        let mut out = Vec::new();
        assert_eq!(queue.drain_all(|x| out.push(x)), 2);
        assert_eq!(out, vec![1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn iter_lists_oldest_first() {
        let mut queue = ReleaseQueue::new(1);
        queue.defer(1);
        collect(&mut queue);
        queue.defer(2);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }
}

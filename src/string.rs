//! String (group) tracking.
//!
//! A string is a maximal set of same-coloured, 4-connected stones. The
//! [`StringTable`] keeps, for every live string:
//! - its liberties (sorted),
//! - the ids of adjacent enemy strings (sorted),
//! - the empty points in the 8-neighbourhood of any member (sorted),
//! - its members, as a sorted linked list threaded through `next`.
//!
//! The table does not own the board; callers pass it in and are responsible
//! for setting a point's colour before calling [`StringTable::place`] and for
//! clearing members before calling [`StringTable::remove`].

use crate::board::{Color, Point, Stone, all_neighbors, neighbors};
use crate::constants::{BOARD_MAX, MAX_STRING};

/// Index of a string slot.
pub type StringId = usize;

/// Marker for points that belong to no string.
pub const NO_STRING: StringId = usize::MAX;

/// Terminator of a member list.
pub const STRING_END: Point = usize::MAX;

/// A string of stones.
#[derive(Debug)]
pub struct GoString {
    color: Color,
    libs: Vec<Point>,
    neighbors: Vec<StringId>,
    empties: Vec<Point>,
    origin: Point,
    size: usize,
    live: bool,
}

impl Clone for GoString {
    fn clone(&self) -> Self {
        Self {
            color: self.color,
            libs: self.libs.clone(),
            neighbors: self.neighbors.clone(),
            empties: self.empties.clone(),
            origin: self.origin,
            size: self.size,
            live: self.live,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.color = source.color;
        self.libs.clone_from(&source.libs);
        self.neighbors.clone_from(&source.neighbors);
        self.empties.clone_from(&source.empties);
        self.origin = source.origin;
        self.size = source.size;
        self.live = source.live;
    }
}

impl GoString {
    fn new(color: Color, origin: Point) -> Self {
        Self {
            color,
            libs: Vec::with_capacity(8),
            neighbors: Vec::with_capacity(4),
            empties: Vec::with_capacity(8),
            origin,
            size: 1,
            live: true,
        }
    }

    fn reset(&mut self, color: Color, origin: Point) {
        self.color = color;
        self.libs.clear();
        self.neighbors.clear();
        self.empties.clear();
        self.origin = origin;
        self.size = 1;
        self.live = true;
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Liberties in ascending order.
    #[inline]
    pub fn libs(&self) -> &[Point] {
        &self.libs
    }

    #[inline]
    pub fn lib_count(&self) -> usize {
        self.libs.len()
    }

    /// Ids of adjacent enemy strings in ascending order.
    #[inline]
    pub fn neighbors(&self) -> &[StringId] {
        &self.neighbors
    }

    /// Empty points touching the string orthogonally or diagonally.
    #[inline]
    pub fn empties(&self) -> &[Point] {
        &self.empties
    }

    /// Smallest member point.
    #[inline]
    pub fn origin(&self) -> Point {
        self.origin
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// False once the string was captured or merged away.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    #[inline]
    pub fn has_lib(&self, pt: Point) -> bool {
        self.libs.binary_search(&pt).is_ok()
    }
}

fn insert_sorted<T: Ord + Copy>(v: &mut Vec<T>, x: T) -> bool {
    match v.binary_search(&x) {
        Ok(_) => false,
        Err(i) => {
            v.insert(i, x);
            true
        }
    }
}

fn remove_sorted<T: Ord + Copy>(v: &mut Vec<T>, x: T) -> bool {
    match v.binary_search(&x) {
        Ok(i) => {
            v.remove(i);
            true
        }
        Err(_) => false,
    }
}

/// All strings on a board.
pub struct StringTable {
    strings: Vec<GoString>,
    id: [StringId; BOARD_MAX],
    next: [Point; BOARD_MAX],
}

impl Clone for StringTable {
    fn clone(&self) -> Self {
        Self {
            strings: self.strings.clone(),
            id: self.id,
            next: self.next,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.strings.clone_from(&source.strings);
        self.id = source.id;
        self.next = source.next;
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the members of a string.
pub struct Members<'a> {
    next: &'a [Point; BOARD_MAX],
    cur: Point,
}

impl Iterator for Members<'_> {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        if self.cur == STRING_END {
            return None;
        }
        let pt = self.cur;
        self.cur = self.next[pt];
        Some(pt)
    }
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: Vec::with_capacity(MAX_STRING),
            id: [NO_STRING; BOARD_MAX],
            next: [STRING_END; BOARD_MAX],
        }
    }

    /// Drop every string.
    pub fn clear(&mut self) {
        self.strings.clear();
        self.id = [NO_STRING; BOARD_MAX];
        self.next = [STRING_END; BOARD_MAX];
    }

    /// The string occupying `pt`, if any.
    #[inline]
    pub fn id_at(&self, pt: Point) -> Option<StringId> {
        let id = self.id[pt];
        (id != NO_STRING).then_some(id)
    }

    #[inline]
    pub fn get(&self, id: StringId) -> &GoString {
        &self.strings[id]
    }

    /// The string occupying `pt`, if any.
    #[inline]
    pub fn at(&self, pt: Point) -> Option<&GoString> {
        self.id_at(pt).map(|id| &self.strings[id])
    }

    /// Members of a string in ascending order.
    pub fn members(&self, id: StringId) -> Members<'_> {
        Members {
            next: &self.next,
            cur: self.strings[id].origin,
        }
    }

    /// Live strings with their ids.
    pub fn live(&self) -> impl Iterator<Item = (StringId, &GoString)> {
        self.strings.iter().enumerate().filter(|(_, s)| s.live)
    }

    /// Whether a new string fits within `MAX_STRING`.
    ///
    /// Allocation itself never fails; callers check this before a move that
    /// creates a string so capacity violations surface as illegal moves.
    pub fn has_free_slot(&self) -> bool {
        self.strings.len() < MAX_STRING || self.strings.iter().any(|s| !s.live)
    }

    fn allocate(&mut self, color: Color, origin: Point) -> StringId {
        if let Some(id) = self.strings.iter().position(|s| !s.live) {
            self.strings[id].reset(color, origin);
            return id;
        }
        self.strings.push(GoString::new(color, origin));
        self.strings.len() - 1
    }

    /// Register a stone of `color` that was just put on `pt`.
    ///
    /// Removes `pt` from the liberties and empties of surrounding strings,
    /// then extends or creates the stone's string, merging every friendly
    /// neighbour into it. Enemy strings are not checked for capture here.
    /// Returns the id of the resulting string.
    pub fn place(&mut self, board: &[Stone; BOARD_MAX], pt: Point, color: Color) -> StringId {
        let mut friends = [NO_STRING; 4];
        let mut n_friends = 0;
        for n in neighbors(pt) {
            if let Some(id) = self.id_at(n) {
                if self.strings[id].color == color && !friends[..n_friends].contains(&id) {
                    friends[n_friends] = id;
                    n_friends += 1;
                }
            }
        }

        let id = if n_friends == 0 {
            self.allocate(color, pt)
        } else {
            friends[0]
        };

        self.occupy(pt);

        if n_friends == 0 {
            self.id[pt] = id;
            self.next[pt] = STRING_END;
        } else {
            self.add_member(id, pt);
            self.strings[id].size += 1;
        }
        self.add_point_relations(board, id, pt);

        for &other in friends.iter().take(n_friends).skip(1) {
            self.merge(id, other);
        }
        id
    }

    /// Remove `pt` from the liberties and empties of every string around it.
    fn occupy(&mut self, pt: Point) {
        for n in neighbors(pt) {
            if let Some(id) = self.id_at(n) {
                remove_sorted(&mut self.strings[id].libs, pt);
            }
        }
        for n in all_neighbors(pt) {
            if let Some(id) = self.id_at(n) {
                remove_sorted(&mut self.strings[id].empties, pt);
            }
        }
    }

    /// Add the liberties, empties and enemy links contributed by member `pt`.
    fn add_point_relations(&mut self, board: &[Stone; BOARD_MAX], id: StringId, pt: Point) {
        let color = self.strings[id].color;
        for n in neighbors(pt) {
            match board[n] {
                Stone::Empty => {
                    insert_sorted(&mut self.strings[id].libs, n);
                }
                Stone::Black | Stone::White => {
                    let other = self.id[n];
                    if other != NO_STRING && self.strings[other].color != color {
                        insert_sorted(&mut self.strings[id].neighbors, other);
                        insert_sorted(&mut self.strings[other].neighbors, id);
                    }
                }
                Stone::OffBoard => {}
            }
        }
        for n in all_neighbors(pt) {
            if board[n] == Stone::Empty {
                insert_sorted(&mut self.strings[id].empties, n);
            }
        }
    }

    /// Insert `pt` into the sorted member list of `id`.
    fn add_member(&mut self, id: StringId, pt: Point) {
        self.id[pt] = id;
        let origin = self.strings[id].origin;
        if pt < origin {
            self.next[pt] = origin;
            self.strings[id].origin = pt;
            return;
        }
        let mut cur = origin;
        while self.next[cur] != STRING_END && self.next[cur] < pt {
            cur = self.next[cur];
        }
        self.next[pt] = self.next[cur];
        self.next[cur] = pt;
    }

    /// Merge string `src` into `dst`.
    fn merge(&mut self, dst: StringId, src: StringId) {
        // Member lists are both sorted; merge them.
        let mut a = self.strings[dst].origin;
        let mut b = self.strings[src].origin;
        let mut head = STRING_END;
        let mut tail = STRING_END;
        while a != STRING_END || b != STRING_END {
            let take = if b == STRING_END || (a != STRING_END && a < b) {
                let p = a;
                a = self.next[a];
                p
            } else {
                let p = b;
                b = self.next[b];
                p
            };
            if tail == STRING_END {
                head = take;
            } else {
                self.next[tail] = take;
            }
            tail = take;
            self.id[take] = dst;
        }
        self.next[tail] = STRING_END;

        let src_libs = std::mem::take(&mut self.strings[src].libs);
        let src_empties = std::mem::take(&mut self.strings[src].empties);
        let src_neighbors = std::mem::take(&mut self.strings[src].neighbors);
        let src_size = self.strings[src].size;
        let d = &mut self.strings[dst];
        d.origin = head;
        d.size += src_size;
        for &lib in &src_libs {
            insert_sorted(&mut self.strings[dst].libs, lib);
        }
        for &e in &src_empties {
            insert_sorted(&mut self.strings[dst].empties, e);
        }
        for &n in &src_neighbors {
            let other = &mut self.strings[n].neighbors;
            remove_sorted(other, src);
            insert_sorted(other, dst);
            insert_sorted(&mut self.strings[dst].neighbors, n);
        }

        let dead = &mut self.strings[src];
        dead.libs = src_libs;
        dead.empties = src_empties;
        dead.neighbors = src_neighbors;
        dead.live = false;
    }

    /// Unregister string `id` whose members were already cleared on `board`.
    ///
    /// Every freed point becomes a liberty of the adjacent strings and an
    /// empty of the strings touching it.
    pub fn remove(&mut self, board: &[Stone; BOARD_MAX], id: StringId) {
        let members: Vec<Point> = self.members(id).collect();
        for &pt in &members {
            self.id[pt] = NO_STRING;
            self.next[pt] = STRING_END;
        }
        for &pt in &members {
            debug_assert_eq!(board[pt], Stone::Empty);
            for n in neighbors(pt) {
                if let Some(other) = self.id_at(n) {
                    insert_sorted(&mut self.strings[other].libs, pt);
                }
            }
            for n in all_neighbors(pt) {
                if let Some(other) = self.id_at(n) {
                    insert_sorted(&mut self.strings[other].empties, pt);
                }
            }
        }
        let neighbors = std::mem::take(&mut self.strings[id].neighbors);
        for &n in &neighbors {
            remove_sorted(&mut self.strings[n].neighbors, id);
        }
        let s = &mut self.strings[id];
        s.neighbors = neighbors;
        s.live = false;
    }

    /// Check every invariant of the table against `board`.
    ///
    /// Intended for tests and debugging; returns a description of the first
    /// violation found.
    pub fn validate(&self, board: &[Stone; BOARD_MAX]) -> std::result::Result<(), String> {
        let mut seen = [false; BOARD_MAX];
        for (id, s) in self.live() {
            let members: Vec<Point> = self.members(id).collect();
            if members.len() != s.size {
                return Err(format!("string {id}: size {} but {} members", s.size, members.len()));
            }
            if members.first() != Some(&s.origin) {
                return Err(format!("string {id}: origin is not the smallest member"));
            }
            let mut libs = Vec::new();
            let mut empties = Vec::new();
            let mut enemies = Vec::new();
            for &pt in &members {
                if seen[pt] {
                    return Err(format!("point {pt} belongs to two strings"));
                }
                seen[pt] = true;
                if board[pt] != Stone::from(s.color) || self.id[pt] != id {
                    return Err(format!("point {pt} disagrees with string {id}"));
                }
                for n in neighbors(pt) {
                    match board[n] {
                        Stone::Empty => libs.push(n),
                        Stone::OffBoard => {}
                        stone if stone != Stone::from(s.color) => enemies.push(self.id[n]),
                        _ => {
                            if self.id[n] != id {
                                return Err(format!("adjacent friendly stones in different strings at {pt}"));
                            }
                        }
                    }
                }
                empties.extend(all_neighbors(pt).into_iter().filter(|&n| board[n] == Stone::Empty));
            }
            for v in [&mut libs, &mut empties, &mut enemies] {
                v.sort_unstable();
                v.dedup();
            }
            if libs != s.libs {
                return Err(format!("string {id}: liberties {:?}, expected {libs:?}", s.libs));
            }
            if empties != s.empties {
                return Err(format!("string {id}: empties {:?}, expected {empties:?}", s.empties));
            }
            if enemies != s.neighbors {
                return Err(format!("string {id}: neighbours {:?}, expected {enemies:?}", s.neighbors));
            }
        }
        for (pt, stone) in board.iter().enumerate() {
            if stone.is_stone() && !seen[pt] {
                return Err(format!("stone at {pt} belongs to no live string"));
            }
        }
        Ok(())
    }
}

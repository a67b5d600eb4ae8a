use crate::{Position, TileKind, map::Grid};

/// Finds the cell of `kind` closest to `from` by manhattan distance.
///
/// Cells are scanned column by column (`x` outer, `y` inner) and only a
/// strictly shorter distance replaces the current best, so on a tie the cell
/// with the smaller `x`, then the smaller `y`, wins. Returns `None`
/// when the board has no cell of that kind.
pub fn nearest_tile_of_kind(
    tiles: &Grid<TileKind>,
    kind: TileKind,
    from: Position,
) -> Option<Position> {
    nearest_matching(tiles, from, |_, tile| tile == kind)
}

/// Same as [`nearest_tile_of_kind`] but never returns `from` itself.
///
/// Used after a pickup, when this turn's snapshot still shows the collected
/// resource under the player.
pub fn nearest_other_tile_of_kind(
    tiles: &Grid<TileKind>,
    kind: TileKind,
    from: Position,
) -> Option<Position> {
    nearest_matching(tiles, from, |position, tile| tile == kind && position != from)
}

fn nearest_matching<F>(
    tiles: &Grid<TileKind>,
    from: Position,
    mut matches: F,
) -> Option<Position>
where
    F: FnMut(Position, TileKind) -> bool,
{
    let mut best: Option<(Position, usize)> = None;
    for x in 0..tiles.width() {
        for y in 0..tiles.height() {
            let position = Position::new(x, y);
            if !matches(position, tiles[position]) {
                continue;
            }
            let distance = position.manhattan_distance(&from);
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((position, distance));
            }
        }
    }
    best.map(|(position, _)| position)
}

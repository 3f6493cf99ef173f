use crate::render::{overlay_pixels, PixelAndTextGrid, Texture, TILE_HEIGHT, TILE_WIDTH};
use crate::world::entity::Entity;
use crate::world::geometry::{Direction, Position, TilePosition};
use crate::world::grid2d::Grid2D;
use crate::world::tile::{Neighbours, Tile};

use super::Room;

const TILE_W: i32 = TILE_WIDTH as i32;
const TILE_H: i32 = TILE_HEIGHT as i32;

impl Room {
    /// Draws the room into `target` with the camera centred on the player.
    pub fn render(&self, target: &mut PixelAndTextGrid) {
        let (origin_x, origin_y) = centred_origin(self.player.position(), target);
        self.render_at(target, origin_x, origin_y);
    }

    /// Draws the room with cell `(0, 0)`'s top-left pixel at `(origin_x, origin_y)`.
    ///
    /// Floor tiles go down first, then wall tiles, then every entity (player included)
    /// in order of hitbox top edge so lower entities overlap higher ones. Tile textures
    /// are anchored to the bottom-right corner of their cell; entity textures are
    /// centred on their hitbox.
    pub fn render_at(&self, target: &mut PixelAndTextGrid, origin_x: i32, origin_y: i32) {
        target.fill(self.reset_color);
        draw_layer(&self.floor_tiles, target, origin_x, origin_y);
        draw_layer(&self.wall_tiles, target, origin_x, origin_y);

        let mut drawn: Vec<&dyn Entity> = self
            .entities
            .iter()
            .map(|slot| slot.entity.as_ref())
            .collect();
        drawn.push(&self.player);
        drawn.sort_by(|a, b| a.hitbox().y().total_cmp(&b.hitbox().y()));
        for entity in drawn {
            draw_entity(entity, target, origin_x, origin_y);
        }
    }
}

fn centred_origin(focus: Position, target: &PixelAndTextGrid) -> (i32, i32) {
    let x = target.width() as i32 / 2 - (focus.x * f64::from(TILE_WIDTH)).round() as i32;
    let y = target.height() as i32 / 2 - (focus.y * f64::from(TILE_HEIGHT)).round() as i32;
    (x, y)
}

fn draw_layer(grid: &Grid2D<Box<dyn Tile>>, target: &mut PixelAndTextGrid, origin_x: i32, origin_y: i32) {
    for (position, tile) in grid.iter() {
        let neighbours = if tile.is_smart() {
            same_kind_neighbours(grid, position, tile.id())
        } else {
            Neighbours::NONE
        };
        let texture = tile.texture(neighbours);
        let cell_right = origin_x + (position.x as i32 + 1) * TILE_W;
        let cell_bottom = origin_y + (position.y as i32 + 1) * TILE_H;
        blit(&texture, target, cell_right - texture.width() as i32, cell_bottom - texture.height() as i32);
    }
}

fn same_kind_neighbours(grid: &Grid2D<Box<dyn Tile>>, position: TilePosition, id: &str) -> Neighbours {
    Direction::ALL
        .into_iter()
        .filter(|direction| {
            let cell = position.neighbour(*direction);
            grid.get_or_none(cell.x, cell.y)
                .is_some_and(|neighbour| neighbour.id() == id)
        })
        .fold(Neighbours::NONE, Neighbours::with)
}

fn draw_entity(entity: &dyn Entity, target: &mut PixelAndTextGrid, origin_x: i32, origin_y: i32) {
    let texture = entity.texture();
    let hitbox = entity.hitbox();
    let centre_x = (hitbox.x() + hitbox.width() / 2.0) * f64::from(TILE_WIDTH);
    let centre_y = (hitbox.y() + hitbox.height() / 2.0) * f64::from(TILE_HEIGHT);
    let x = origin_x + centre_x.round() as i32 - texture.width() as i32 / 2;
    let y = origin_y + centre_y.round() as i32 - texture.height() as i32 / 2;
    blit(&texture, target, x, y);
}

fn blit(texture: &Texture, target: &mut PixelAndTextGrid, x: i32, y: i32) {
    let off_screen = x >= target.width() as i32
        || y >= target.height() as i32
        || x + texture.width() as i32 <= 0
        || y + texture.height() as i32 <= 0;
    if !off_screen {
        overlay_pixels(texture, target, x, y);
    }
}
